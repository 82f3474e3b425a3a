use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use newsfeed::config::Config;
use newsfeed::monitor::{self, MonitorService};
use newsfeed::storage::SqliteArchive;

#[derive(Parser)]
#[command(
    name = "newsfeed",
    version,
    about = "Monitor a DP World Tour player news page and post new entries to Discord",
    long_about = None
)]
struct Cli {
    /// Discord webhook URL
    #[arg(long, env = "NEWSFEED_WEBHOOK_URL")]
    webhook_url: Option<String>,

    /// SQLite archive path
    #[arg(long)]
    database: Option<PathBuf>,

    /// Seconds between runs
    #[arg(long)]
    interval: Option<u64>,

    /// Parse and archive, but never notify
    #[arg(long)]
    dry_run: bool,

    /// Run a single pass and exit
    #[arg(long)]
    once: bool,

    /// Print archived entries and exit
    #[arg(long)]
    dump_archive: bool,

    /// Maximum entries for --dump-archive
    #[arg(long)]
    limit: Option<usize>,

    /// JSONL mirror path; an empty value disables it
    #[arg(long)]
    ledger: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Log format (text, json)
    #[arg(long)]
    log_format: Option<String>,
}

impl Cli {
    /// Flags override every other configuration source
    fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.webhook_url {
            config.notifier.webhook_url = Some(url.clone());
        }
        if let Some(path) = &self.database {
            config.archive.database_path = path.clone();
        }
        if let Some(secs) = self.interval {
            config.monitor.interval_secs = secs;
        }
        if self.dry_run {
            config.monitor.dry_run = true;
        }
        if let Some(path) = &self.ledger {
            config.archive.ledger_path = if path.trim().is_empty() {
                None
            } else {
                Some(PathBuf::from(path))
            };
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.logging.format = format.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    setup_tracing(&config.logging.level, &config.logging.format);
    config.validate().context("Invalid configuration")?;

    if cli.dump_archive {
        let archive = SqliteArchive::open(&config.archive.database_path)
            .context("Failed to open archive")?;
        for line in monitor::dump_archive(&archive, cli.limit)? {
            println!("{line}");
        }
        return Ok(());
    }

    let service = MonitorService::from_config(&config)?;

    if cli.once {
        let report = service.run_once().await?;
        tracing::info!(?report, "Single run finished");
        return Ok(());
    }

    tracing::info!(
        url = %config.fetch.target_url,
        interval_secs = config.monitor.interval_secs,
        dry_run = config.monitor.dry_run,
        "Starting news monitor"
    );
    service.run_forever().await;
    Ok(())
}

fn setup_tracing(level: &str, format: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("newsfeed={level},warn")));

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}
