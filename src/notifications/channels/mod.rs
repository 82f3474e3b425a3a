//! Notification channels for delivering new records
//!
//! A channel accepts a batch of records and is responsible for splitting
//! it into requests its endpoint accepts.

pub mod discord;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::NewsRecord;

/// Result type for channel operations
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Errors that can occur during channel operations
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid channel configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The endpoint answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl ChannelError {
    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::HttpError(_) => true,
            Self::Rejected { status, .. } => *status >= 500,
            Self::InvalidConfig(_) => false,
        }
    }
}

/// Result of sending one batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryStatus {
    /// Channel that delivered the batch
    pub channel: String,
    /// Records delivered
    pub delivered: usize,
    /// Requests made (one per chunk)
    pub requests: usize,
    /// Timestamp of delivery
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl DeliveryStatus {
    pub fn new(channel: impl Into<String>, delivered: usize, requests: usize) -> Self {
        Self {
            channel: channel.into(),
            delivered,
            requests,
            timestamp: chrono::Utc::now(),
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} record(s) in {} request(s)",
            self.channel, self.delivered, self.requests
        )
    }
}

/// Downstream receiver of newly observed records
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Get the channel name
    fn name(&self) -> &str;

    /// Deliver `batch`; an empty batch sends nothing
    async fn send(&self, batch: &[NewsRecord]) -> ChannelResult<DeliveryStatus>;
}
