//! Polling service: fetch, extract, gate, persist, notify
//!
//! One run is strictly sequential. The continuous loop runs one pass at a
//! time separated by the configured interval; a failed pass is logged and
//! the loop waits for the next one.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::config::Config;
use crate::crawler::FetchEngine;
use crate::error::{Error, FetchError, NewsfeedErrorTrait, Result};
use crate::models::StrategyKind;
use crate::notifications::{DiscordWebhook, Notifier};
use crate::parser::{NewsExtractor, UrlNormalizer};
use crate::storage::{ArchiveStore, DedupGate, LedgerWriter, SharedArchive, SqliteArchive};

/// Counters for one completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Strategy that retrieved the page
    pub strategy: StrategyKind,
    /// Fetch attempts the run needed
    pub attempts: usize,
    /// Unique records extracted from the payload
    pub extracted: usize,
    /// Records absent from the archive before this run
    pub new: usize,
    /// Entries handed to the archive
    pub persisted: usize,
    /// Entries the archive actually inserted
    pub inserted: usize,
    /// Records delivered to the notifier
    pub notified: usize,
}

/// Drives fetch → extract → gate → notify
pub struct MonitorService {
    engine: FetchEngine,
    extractor: NewsExtractor,
    archive: SharedArchive,
    ledger: Option<LedgerWriter>,
    notifier: Option<Arc<dyn Notifier>>,
    target_url: String,
    dry_run: bool,
    interval: Duration,
}

impl MonitorService {
    pub fn new(
        engine: FetchEngine,
        extractor: NewsExtractor,
        archive: SharedArchive,
        target_url: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            extractor,
            archive,
            ledger: None,
            notifier: None,
            target_url: target_url.into(),
            dry_run: false,
            interval: Duration::from_secs(3600),
        }
    }

    /// Build every component from configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when no webhook URL is configured outside a
    /// dry run, `FetchError::NoStrategy` when every configured strategy is
    /// disabled or unavailable, or the matching error when a component
    /// cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let archive = SqliteArchive::open(&config.archive.database_path)?;
        let extractor = NewsExtractor::new(UrlNormalizer::new(&config.fetch.base_url)?);
        let engine = FetchEngine::from_config(&config.fetch);
        let strategies = engine.strategy_kinds();
        if strategies.is_empty() {
            return Err(FetchError::NoStrategy {
                url: config.fetch.target_url.clone(),
            }
            .into());
        }
        info!(?strategies, "Fetch strategies ready");

        let mut service = Self::new(
            engine,
            extractor,
            Arc::new(archive),
            config.fetch.target_url.clone(),
        )
        .with_dry_run(config.monitor.dry_run)
        .with_interval(config.poll_interval());

        if let Some(path) = &config.archive.ledger_path {
            service = service.with_ledger(LedgerWriter::new(path));
        }

        match &config.notifier.webhook_url {
            Some(url) => {
                let channel = DiscordWebhook::new(url.clone(), &config.notifier)?;
                service = service.with_notifier(Arc::new(channel));
            }
            None if !config.monitor.dry_run => {
                return Err(Error::config(
                    "a webhook URL is required unless running with --dry-run",
                ));
            }
            None => {}
        }

        Ok(service)
    }

    #[must_use]
    pub fn with_ledger(mut self, ledger: LedgerWriter) -> Self {
        self.ledger = Some(ledger);
        self
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Perform one complete pass
    ///
    /// # Errors
    ///
    /// Fetch, extraction, persistence and delivery failures abort the run
    /// and are returned as-is. A ledger export failure is only logged.
    pub async fn run_once(&self) -> Result<RunReport> {
        let fetched = self.engine.fetch_payload(&self.target_url).await?;
        let extraction = self.extractor.extract(&fetched.payload);
        let records = extraction.records;

        let outcome =
            DedupGate::new(self.archive.as_ref()).admit(&records, Some(&fetched.payload))?;

        if let Some(ledger) = &self.ledger {
            self.export_ledger(ledger);
        }

        let notified = if outcome.new_records.is_empty() {
            info!("No new news entries");
            0
        } else if self.dry_run {
            info!(
                new = outcome.new_records.len(),
                "Dry run: skipping notification"
            );
            0
        } else if let Some(notifier) = &self.notifier {
            notifier.send(&outcome.new_records).await?.delivered
        } else {
            warn!(new = outcome.new_records.len(), "No notifier configured");
            0
        };

        let report = RunReport {
            strategy: fetched.page.strategy,
            attempts: fetched.page.attempts.len(),
            extracted: records.len(),
            new: outcome.new_records.len(),
            persisted: outcome.persisted.len(),
            inserted: outcome.inserted,
            notified,
        };

        info!(
            strategy = %report.strategy,
            attempts = report.attempts,
            extracted = report.extracted,
            new = report.new,
            notified = report.notified,
            "Run complete"
        );
        Ok(report)
    }

    fn export_ledger(&self, ledger: &LedgerWriter) {
        let result = self
            .archive
            .list(None)
            .and_then(|entries| ledger.write_all(&entries));

        if let Err(e) = result {
            warn!(path = %ledger.path().display(), error = %e, "Ledger export failed");
        }
    }

    /// Repeat [`Self::run_once`] until `shutdown` resolves
    ///
    /// `shutdown` is only observed while idling; a run in progress always
    /// completes.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            if let Err(e) = self.run_once().await {
                error!(
                    error = %e,
                    category = %e.category(),
                    recoverable = e.is_recoverable(),
                    "Run failed"
                );
            }

            info!(seconds = self.interval.as_secs(), "Sleeping until next run");
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping monitor");
                    break;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }

    /// Repeat [`Self::run_once`] until Ctrl-C
    pub async fn run_forever(&self) {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Unable to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await;
    }

    /// Archive summary lines, newest first
    pub fn dump_archive(&self, limit: Option<usize>) -> Result<Vec<String>> {
        dump_archive(self.archive.as_ref(), limit)
    }
}

/// Render stored entries as `<published> | <title> -> <url>` lines
pub fn dump_archive(store: &dyn ArchiveStore, limit: Option<usize>) -> Result<Vec<String>> {
    Ok(store
        .list(limit)?
        .iter()
        .map(|entry| entry.record.display_line())
        .collect())
}
