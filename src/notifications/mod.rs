//! Delivery of newly observed news records
//!
//! ```text
//! ┌────────────────────────────┐
//! │       MonitorService       │
//! │  new records after gating  │
//! └────────────────────────────┘
//!               │
//!               ▼
//! ┌────────────────────────────┐
//! │     Notifier (trait)       │
//! │  chunking, truncation      │
//! └────────────────────────────┘
//!               │
//!               ▼
//!        ┌─────────────┐
//!        │   Discord   │
//!        │   webhook   │
//!        └─────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use newsfeed::config::NotifierConfig;
//! use newsfeed::notifications::{DiscordWebhook, Notifier};
//!
//! let channel = DiscordWebhook::new("https://discord.com/api/webhooks/...", &NotifierConfig::default())?;
//! channel.send(&new_records).await?;
//! ```

pub mod channels;

pub use channels::discord::DiscordWebhook;
pub use channels::{ChannelError, ChannelResult, DeliveryStatus, Notifier};
