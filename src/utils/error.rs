//! Error types for the news monitor
//!
//! This module defines the domain error types used throughout the pipeline.
//! Each stage owns one enum; [`crate::error::Error`] unifies them at the
//! service boundary.

use std::fmt;
use thiserror::Error;

use crate::models::StrategyKind;

/// Why a single fetch attempt failed
///
/// Kept small and cloneable so the engine can remember the last failure
/// after the underlying transport error has been dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The site answered 403: bot detection rejected the fingerprint
    Blocked,

    /// Any other HTTP status >= 400
    HttpStatus(u16),

    /// The per-attempt timeout elapsed
    Timeout,

    /// Connection, TLS or protocol failure before a status was received
    Transport(String),
}

impl FailureReason {
    /// Classify a non-success HTTP status
    pub fn from_status(status: u16) -> Self {
        if status == 403 {
            Self::Blocked
        } else {
            Self::HttpStatus(status)
        }
    }

    /// Classify a reqwest transport error
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err.to_string())
        }
    }

    /// HTTP status associated with the failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Blocked => Some(403),
            Self::HttpStatus(code) => Some(*code),
            Self::Timeout | Self::Transport(_) => None,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blocked => write!(f, "blocked by the site (HTTP 403)"),
            Self::HttpStatus(code) => write!(f, "HTTP status {code}"),
            Self::Timeout => write!(f, "request timed out"),
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
        }
    }
}

/// Errors that can occur while retrieving the target page
#[derive(Error, Debug)]
pub enum FetchError {
    /// Every strategy spent its attempt budget
    #[error("failed to retrieve {url} after {attempts} attempt(s): {last}")]
    Exhausted {
        url: String,
        attempts: usize,
        last: FailureReason,
    },

    /// Capability detection left no usable strategy
    #[error("no fetch strategy is available for {url}")]
    NoStrategy { url: String },

    /// HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    /// A strategy's client is not compiled in or cannot start on this host
    #[error("{strategy} is unavailable: {reason}")]
    Unavailable {
        strategy: StrategyKind,
        reason: String,
    },

    /// Invalid target URL
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Last failure recorded before giving up, if any attempt was made
    pub fn last_failure(&self) -> Option<&FailureReason> {
        match self {
            Self::Exhausted { last, .. } => Some(last),
            _ => None,
        }
    }

    /// True when the last failure was the site rejecting us
    pub fn is_blocked(&self) -> bool {
        matches!(self.last_failure(), Some(FailureReason::Blocked))
    }
}

/// Errors locating or decoding the embedded data payload
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The page has no payload marker script
    #[error("payload marker <script id=\"{marker}\"> not found")]
    MarkerMissing { marker: &'static str },

    /// The marker exists but carries no data
    #[error("payload marker <script id=\"{marker}\"> is empty")]
    EmptyPayload { marker: &'static str },

    /// The marker content is not valid JSON
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Errors normalizing a timestamp string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// None of the supported formats matched
    #[error("unable to parse datetime value: {0:?}")]
    UnsupportedDatetime(String),
}

/// Errors reading or writing the archive and its mirror
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// SQLite failure
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding of the raw context or a ledger line failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored row could not be decoded back into an entry
    #[error("corrupt archive row {identifier}: {reason}")]
    CorruptRow { identifier: String, reason: String },
}
