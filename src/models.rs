// Core data structures for the news monitor

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::parser::datetime::to_iso_seconds;
use crate::utils::error::FailureReason;

/// A single news entry extracted from the player page payload
///
/// `published` is a UTC-naive instant: normalized to UTC, stored
/// without an offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsRecord {
    /// Stable dedup key (explicit id/slug, or `title::raw_date`)
    pub identifier: String,
    pub title: String,
    /// Always absolute
    pub url: String,
    pub summary: Option<String>,
    pub published: NaiveDateTime,
}

impl NewsRecord {
    /// Project into an archive entry captured at `retrieved_at`
    pub fn into_entry(
        self,
        retrieved_at: NaiveDateTime,
        raw_context: Option<serde_json::Value>,
    ) -> ArchiveEntry {
        ArchiveEntry {
            record: self,
            retrieved_at,
            raw_context,
        }
    }

    /// One-line human summary used by `--dump-archive`
    pub fn display_line(&self) -> String {
        format!(
            "{} | {} -> {}",
            to_iso_seconds(&self.published),
            self.title,
            self.url
        )
    }
}

/// Persisted projection of a [`NewsRecord`]
///
/// Created once per identifier and never updated.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveEntry {
    pub record: NewsRecord,

    /// Wall-clock UTC time of persistence
    pub retrieved_at: NaiveDateTime,

    /// Full source payload at capture time, kept for forensic replay
    pub raw_context: Option<serde_json::Value>,
}

impl ArchiveEntry {
    pub fn identifier(&self) -> &str {
        &self.record.identifier
    }
}

/// Fetch strategy identity, in fixed priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Chrome-emulating client (TLS, HTTP/2 and header fingerprint)
    PrimaryClient,
    /// Plainer browser-like scraper client used when the primary fails
    FallbackClient,
}

impl StrategyKind {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PrimaryClient => "primary",
            Self::FallbackClient => "fallback",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one attempt against the target page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Failure(FailureReason),
}

/// One entry of the engine's per-call attempt ledger; never persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchAttempt {
    pub strategy: StrategyKind,
    /// Name of the client identity profile used for this attempt
    pub fingerprint: &'static str,
    pub outcome: AttemptOutcome,
}

impl FetchAttempt {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, AttemptOutcome::Success)
    }
}
