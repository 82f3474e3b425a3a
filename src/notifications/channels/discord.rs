//! Discord webhook channel
//!
//! Each record becomes one embed. Discord accepts at most ten embeds per
//! message and caps embed text, so batches are chunked and oversized
//! fields are truncated with a trailing `…`.

use async_trait::async_trait;
use reqwest::header::{HeaderValue, USER_AGENT};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::{ChannelError, ChannelResult, DeliveryStatus, Notifier};
use crate::config::NotifierConfig;
use crate::models::NewsRecord;
use crate::parser::datetime::to_iso_seconds;
use crate::utils::retry::{RandomJitter, RetryConfig};
use crate::utils::truncate_text;

/// Discord's hard limit on embed titles
const MAX_TITLE_LENGTH: usize = 256;

#[derive(Debug, Clone, Serialize, PartialEq)]
struct EmbedFooter {
    text: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
struct DiscordEmbed {
    title: String,
    url: String,
    description: String,
    timestamp: String,
    footer: EmbedFooter,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
struct DiscordWebhookPayload {
    username: String,
    embeds: Vec<DiscordEmbed>,
}

/// Posts new records to a Discord webhook
///
/// # Payload Format
///
/// ```json
/// {
///   "username": "Marcel Schneider News",
///   "embeds": [{
///     "title": "Schneider climbs into contention",
///     "url": "https://www.europeantour.com/dpworld-tour/news/articles/detail/...",
///     "description": "Summary text, truncated to 2048 characters",
///     "timestamp": "2024-03-05T10:30:00Z",
///     "footer": { "text": "DP World Tour" }
///   }]
/// }
/// ```
pub struct DiscordWebhook {
    url: String,
    client: Client,
    username: String,
    footer: String,
    max_items_per_request: usize,
    max_description_len: usize,
    max_retries: u32,
    retry: RetryConfig,
}

impl DiscordWebhook {
    /// Create a channel posting to `url`
    pub fn new(url: impl Into<String>, config: &NotifierConfig) -> ChannelResult<Self> {
        let url = url.into();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ChannelError::InvalidConfig(
                "Webhook URL must start with http:// or https://".to_string(),
            ));
        }
        if config.max_items_per_request == 0 {
            return Err(ChannelError::InvalidConfig(
                "max_items_per_request must be greater than 0".to_string(),
            ));
        }

        let user_agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|e| ChannelError::InvalidConfig(format!("Invalid user agent: {e}")))?;
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(USER_AGENT, user_agent);

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            url,
            client,
            username: config.username.clone(),
            footer: config.footer.clone(),
            max_items_per_request: config.max_items_per_request,
            max_description_len: config.max_description_len,
            max_retries: config.max_retries,
            retry: RetryConfig::with_delays(1_000, 8_000, 250),
        })
    }

    /// Replace the delay schedule between retries
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn build_embed(&self, record: &NewsRecord) -> DiscordEmbed {
        let summary = record.summary.as_deref().unwrap_or_default();
        DiscordEmbed {
            title: truncate_text(&record.title, MAX_TITLE_LENGTH),
            url: record.url.clone(),
            description: truncate_text(summary, self.max_description_len),
            timestamp: format!("{}Z", to_iso_seconds(&record.published)),
            footer: EmbedFooter {
                text: self.footer.clone(),
            },
        }
    }

    fn build_payload(&self, chunk: &[NewsRecord]) -> DiscordWebhookPayload {
        DiscordWebhookPayload {
            username: self.username.clone(),
            embeds: chunk.iter().map(|r| self.build_embed(r)).collect(),
        }
    }

    /// Send the request, retrying 5xx and transport failures
    async fn send_with_retry(&self, payload: &DiscordWebhookPayload) -> ChannelResult<()> {
        let mut attempt = 0;

        loop {
            if attempt > 0 {
                let delay = self.retry.delay_for(attempt, &RandomJitter);
                tracing::debug!(
                    attempt = attempt + 1,
                    max = self.max_retries + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying webhook request"
                );
                tokio::time::sleep(delay).await;
            }

            let result = match self.client.post(&self.url).json(payload).send().await {
                Ok(response) if response.status().is_success() => return Ok(()),
                Ok(response) => {
                    let status = response.status().as_u16();
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unable to read response body".to_string());
                    ChannelError::Rejected { status, body }
                }
                Err(e) => ChannelError::HttpError(e),
            };

            tracing::warn!(
                attempt = attempt + 1,
                error = %result,
                "Webhook request failed"
            );

            if !result.is_retryable() || attempt >= self.max_retries {
                return Err(result);
            }
            attempt += 1;
        }
    }
}

#[async_trait]
impl Notifier for DiscordWebhook {
    fn name(&self) -> &str {
        "discord"
    }

    async fn send(&self, batch: &[NewsRecord]) -> ChannelResult<DeliveryStatus> {
        if batch.is_empty() {
            tracing::info!("No new items to send to Discord");
            return Ok(DeliveryStatus::new(self.name(), 0, 0));
        }

        let mut requests = 0;
        for chunk in batch.chunks(self.max_items_per_request) {
            let payload = self.build_payload(chunk);
            if let Err(e) = self.send_with_retry(&payload).await {
                tracing::error!(error = %e, items = chunk.len(), "Failed to send news to Discord");
                return Err(e);
            }
            requests += 1;
            tracing::info!(items = chunk.len(), "Posted news item(s) to Discord");
        }

        Ok(DeliveryStatus::new(self.name(), batch.len(), requests))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(summary: Option<&str>) -> NewsRecord {
        NewsRecord {
            identifier: "id-1".to_string(),
            title: "Schneider climbs into contention".to_string(),
            url: "https://www.europeantour.com/news/1".to_string(),
            summary: summary.map(String::from),
            published: NaiveDate::from_ymd_opt(2024, 3, 5)
                .unwrap()
                .and_hms_micro_opt(10, 30, 0, 123_456)
                .unwrap(),
        }
    }

    fn channel() -> DiscordWebhook {
        DiscordWebhook::new("https://discord.com/api/webhooks/1/abc", &NotifierConfig::default())
            .unwrap()
    }

    #[test]
    fn test_rejects_invalid_url() {
        let result = DiscordWebhook::new("ftp://example.com", &NotifierConfig::default());
        assert!(matches!(result, Err(ChannelError::InvalidConfig(_))));
    }

    #[test]
    fn test_embed_shape() {
        let embed = channel().build_embed(&record(Some("Short summary")));

        assert_eq!(embed.title, "Schneider climbs into contention");
        assert_eq!(embed.description, "Short summary");
        assert_eq!(embed.timestamp, "2024-03-05T10:30:00Z");
        assert_eq!(embed.footer.text, "DP World Tour");
    }

    #[test]
    fn test_missing_summary_is_empty_description() {
        let embed = channel().build_embed(&record(None));
        assert_eq!(embed.description, "");
    }

    #[test]
    fn test_long_summary_truncated() {
        let long = "x".repeat(3000);
        let embed = channel().build_embed(&record(Some(&long)));

        assert_eq!(embed.description.chars().count(), 2048);
        assert!(embed.description.ends_with('…'));
    }

    #[test]
    fn test_payload_serialization() {
        let payload = channel().build_payload(&[record(Some("s"))]);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["username"], "Marcel Schneider News");
        assert_eq!(json["embeds"].as_array().unwrap().len(), 1);
        assert_eq!(json["embeds"][0]["footer"]["text"], "DP World Tour");
    }

    #[tokio::test]
    async fn test_empty_batch_sends_nothing() {
        // Unroutable URL: any request would fail
        let channel =
            DiscordWebhook::new("http://127.0.0.1:9/webhook", &NotifierConfig::default()).unwrap();
        let status = channel.send(&[]).await.unwrap();
        assert_eq!(status.delivered, 0);
        assert_eq!(status.requests, 0);
    }
}
