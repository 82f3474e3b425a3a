//! Configuration management for the news monitor
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `NEWSFEED_*` environment variables (a `.env` file in the working
//! directory is loaded first and never overrides variables that are
//! already set). Command-line flags are applied last by the binary.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::StrategyKind;
use crate::utils::retry::RetryConfig;

/// Player news page polled by default
pub const DEFAULT_TARGET_URL: &str =
    "https://www.europeantour.com/players/marcel-schneider-35703/news?tour=dpworld-tour";

/// Origin relative payload URLs are resolved against
pub const DEFAULT_BASE_URL: &str = "https://www.europeantour.com";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fetch engine configuration
    pub fetch: FetchConfig,

    /// Archive and ledger locations
    pub archive: ArchiveConfig,

    /// Discord webhook configuration
    pub notifier: NotifierConfig,

    /// Polling loop configuration
    pub monitor: MonitorConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Fetch engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Page carrying the embedded payload
    pub target_url: String,

    /// Origin used to absolutize relative article URLs
    pub base_url: String,

    /// Per-attempt timeout in seconds
    pub request_timeout_secs: u64,

    /// Attempts per strategy unless the strategy overrides it
    pub max_attempts: u32,

    /// Strategies in priority order
    pub strategies: Vec<StrategySettings>,

    /// Request the site root before the target page
    pub warm_up: bool,

    /// Lower bound of the pause between warm-up and target request
    pub warm_up_jitter_min_ms: u64,

    /// Upper bound of the pause between warm-up and target request
    pub warm_up_jitter_max_ms: u64,

    /// Backoff between attempts within one strategy
    pub retry: RetryConfig,
}

/// One entry of the strategy list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategySettings {
    pub kind: StrategyKind,

    /// Overrides [`FetchConfig::max_attempts`] for this strategy
    #[serde(default)]
    pub max_attempts: Option<u32>,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl StrategySettings {
    pub fn new(kind: StrategyKind) -> Self {
        Self {
            kind,
            max_attempts: None,
            enabled: true,
        }
    }
}

/// Archive and ledger locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// SQLite database path
    pub database_path: PathBuf,

    /// JSONL mirror of the archive; `None` disables it
    pub ledger_path: Option<PathBuf>,
}

/// Discord webhook configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Webhook URL; required unless running dry or dumping the archive
    pub webhook_url: Option<String>,

    /// Display name of the posting bot
    pub username: String,

    /// Footer text on every embed
    pub footer: String,

    /// User-Agent for webhook requests
    pub user_agent: String,

    /// Maximum embeds per webhook call
    pub max_items_per_request: usize,

    /// Maximum embed description length in characters
    pub max_description_len: usize,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Retries on 5xx or transport failures
    pub max_retries: u32,
}

/// Polling loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Idle time between runs in seconds
    pub interval_secs: u64,

    /// Parse and archive, never notify
    pub dry_run: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            target_url: DEFAULT_TARGET_URL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 30,
            max_attempts: 3,
            strategies: vec![
                StrategySettings::new(StrategyKind::PrimaryClient),
                StrategySettings::new(StrategyKind::FallbackClient),
            ],
            warm_up: true,
            warm_up_jitter_min_ms: 800,
            warm_up_jitter_max_ms: 2_500,
            retry: RetryConfig::default(),
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("news_archive.sqlite3"),
            ledger_path: Some(PathBuf::from("archive/news_archive.jsonl")),
        }
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            username: String::from("Marcel Schneider News"),
            footer: String::from("DP World Tour"),
            user_agent: String::from("MarcelNewsBot/1.0"),
            max_items_per_request: 10,
            max_description_len: 2048,
            timeout_secs: 15,
            max_retries: 2,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3600,
            dry_run: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Config {
    /// Defaults (or `path`), then `.env` and environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        // Missing .env is the common case
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(e).context("Failed to read .env file");
            }
        }

        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from environment variables over the defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Overlay `NEWSFEED_*` environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        if let Some(url) = env_string("NEWSFEED_WEBHOOK_URL") {
            self.notifier.webhook_url = Some(url);
        }
        if let Some(url) = env_string("NEWSFEED_TARGET_URL") {
            self.fetch.target_url = url;
        }
        if let Some(url) = env_string("NEWSFEED_BASE_URL") {
            self.fetch.base_url = url;
        }
        if let Some(secs) = env_parse("NEWSFEED_REQUEST_TIMEOUT")? {
            self.fetch.request_timeout_secs = secs;
        }
        if let Some(attempts) = env_parse("NEWSFEED_MAX_ATTEMPTS")? {
            self.fetch.max_attempts = attempts;
        }
        if let Some(path) = env_string("NEWSFEED_DATABASE") {
            self.archive.database_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("NEWSFEED_LEDGER") {
            // Explicitly empty disables the ledger
            self.archive.ledger_path = if path.trim().is_empty() {
                None
            } else {
                Some(PathBuf::from(path))
            };
        }
        if let Some(secs) = env_parse("NEWSFEED_INTERVAL")? {
            self.monitor.interval_secs = secs;
        }
        if let Some(level) = env_string("NEWSFEED_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = env_string("NEWSFEED_LOG_FORMAT") {
            self.logging.format = format;
        }
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.fetch.target_url)
            .with_context(|| format!("Invalid target_url: {}", self.fetch.target_url))?;
        url::Url::parse(&self.fetch.base_url)
            .with_context(|| format!("Invalid base_url: {}", self.fetch.base_url))?;

        if self.fetch.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        if self.fetch.max_attempts == 0 {
            anyhow::bail!("max_attempts must be greater than 0");
        }

        if !self.fetch.strategies.iter().any(|s| s.enabled) {
            anyhow::bail!("at least one fetch strategy must be enabled");
        }

        if self
            .fetch
            .strategies
            .iter()
            .any(|s| s.max_attempts == Some(0))
        {
            anyhow::bail!("strategy max_attempts must be greater than 0");
        }

        if self.fetch.warm_up_jitter_min_ms > self.fetch.warm_up_jitter_max_ms {
            anyhow::bail!("warm_up_jitter_min_ms must not exceed warm_up_jitter_max_ms");
        }

        if let Some(url) = &self.notifier.webhook_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("webhook_url must start with http:// or https://");
            }
        }

        if self.notifier.max_items_per_request == 0 {
            anyhow::bail!("max_items_per_request must be greater than 0");
        }

        if self.notifier.max_description_len == 0 {
            anyhow::bail!("max_description_len must be greater than 0");
        }

        Ok(())
    }

    /// Get polling interval as Duration
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.monitor.interval_secs)
    }
}

impl FetchConfig {
    /// Per-attempt timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Attempt budget for one strategy
    pub fn attempts_for(&self, settings: &StrategySettings) -> u32 {
        settings.max_attempts.unwrap_or(self.max_attempts)
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env_string(key)
        .map(|v| v.trim().parse::<T>())
        .transpose()
        .with_context(|| format!("Invalid value for {key}"))
}
