//! newsfeed - Player news monitor
//!
//! Polls a player's news page on the DP World Tour site, extracts the news
//! entries embedded in the page's Next.js data payload, archives entries it
//! has not seen before and posts them to a Discord webhook.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`crawler`] - Multi-strategy fetch engine with warm-up and backoff
//! - [`parser`] - Payload location, datetime normalization and extraction
//! - [`models`] - Core data structures and types
//! - [`storage`] - SQLite archive, dedup gate and JSONL ledger
//! - [`notifications`] - Discord webhook delivery
//! - [`monitor`] - Single-run and continuous polling service
//! - [`utils`] - Domain errors, retry policy and text helpers
//!
//! # Example
//!
//! ```no_run
//! use newsfeed::config::Config;
//! use newsfeed::monitor::MonitorService;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut config = Config::from_env()?;
//!     config.monitor.dry_run = true;
//!     let service = MonitorService::from_config(&config)?;
//!     let report = service.run_once().await?;
//!     println!("{} new entries", report.new);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crawler;
pub mod error;
pub mod models;
pub mod monitor;
pub mod notifications;
pub mod parser;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::crawler::{FetchEngine, FetchStrategy};
    pub use crate::error::{Error, ErrorCategory, NewsfeedErrorTrait, Result};
    pub use crate::models::{ArchiveEntry, FetchAttempt, NewsRecord, StrategyKind};
    pub use crate::monitor::{MonitorService, RunReport};
    pub use crate::notifications::{DiscordWebhook, Notifier};
    pub use crate::parser::NewsExtractor;
    pub use crate::storage::{ArchiveStore, DedupGate, LedgerWriter, MemoryArchive, SqliteArchive};
}

// Direct re-exports for convenience
pub use models::{ArchiveEntry, NewsRecord};
