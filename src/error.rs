//! Unified error handling for the newsfeed crate
//!
//! This module provides a unified error type that consolidates all domain-specific
//! errors into a single `Error` enum, while maintaining the ability to use
//! domain-specific errors when needed.
//!
//! # Architecture
//!
//! - [`NewsfeedErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use newsfeed::error::{Error, ErrorCategory, NewsfeedErrorTrait};
//!
//! fn handle_error(err: Error) {
//!     if err.is_recoverable() {
//!         println!("Will retry next run: {err}");
//!     } else {
//!         eprintln!("Fatal error ({}): {err}", err.category());
//!     }
//! }
//! ```

use std::fmt;
use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::notifications::ChannelError;
pub use crate::utils::error::{
    ExtractionError, FailureReason, FetchError, ParseError, PersistenceError,
};

/// Common trait for all newsfeed error types
pub trait NewsfeedErrorTrait: std::error::Error {
    /// Check if this error is recoverable (a later run may succeed)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Transport failures, blocks, webhook delivery
    Network,
    /// Payload location and timestamp parsing
    Parsing,
    /// Archive and ledger
    Storage,
    /// Configuration and validation errors
    Config,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Parsing => "parsing",
            Self::Storage => "storage",
            Self::Config => "config",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl NewsfeedErrorTrait for FetchError {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Exhausted { .. } => true,
            Self::NoStrategy { .. }
            | Self::Client(_)
            | Self::Unavailable { .. }
            | Self::InvalidUrl(_) => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidUrl(_) => ErrorCategory::Config,
            _ => ErrorCategory::Network,
        }
    }
}

impl NewsfeedErrorTrait for ExtractionError {
    fn is_recoverable(&self) -> bool {
        // A block page or a half-deployed site may serve a page without data
        true
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Parsing
    }
}

impl NewsfeedErrorTrait for ParseError {
    fn is_recoverable(&self) -> bool {
        false
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Parsing
    }
}

impl NewsfeedErrorTrait for PersistenceError {
    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Database(_))
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Storage
    }
}

impl NewsfeedErrorTrait for ChannelError {
    fn is_recoverable(&self) -> bool {
        self.is_retryable()
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidConfig(_) => ErrorCategory::Config,
            _ => ErrorCategory::Network,
        }
    }
}

/// Unified error type for the newsfeed crate
#[derive(Error, Debug)]
pub enum Error {
    /// Page retrieval failed after every strategy
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// The page carried no usable data payload
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Timestamp parsing errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Archive or ledger errors
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Notifier delivery errors
    #[error("Notification error: {0}")]
    Notification(#[from] ChannelError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

impl NewsfeedErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_recoverable(),
            Self::Extraction(e) => e.is_recoverable(),
            Self::Parse(e) => e.is_recoverable(),
            Self::Persistence(e) => e.is_recoverable(),
            Self::Notification(e) => e.is_recoverable(),
            Self::Config(_) => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(e) => e.category(),
            Self::Extraction(e) => e.category(),
            Self::Parse(e) => e.category(),
            Self::Persistence(e) => e.category(),
            Self::Notification(e) => e.category(),
            Self::Config(_) => ErrorCategory::Config,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

// Conversion from anyhow::Error (configuration loading)
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Config(format!("{err:#}"))
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
