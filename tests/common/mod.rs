//! Common test utilities

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use newsfeed::config::{Config, FetchConfig, StrategySettings};
use newsfeed::models::{NewsRecord, StrategyKind};
use newsfeed::utils::retry::RetryConfig;
use serde_json::{json, Value};

/// Path of the player news page on the mock site
pub const NEWS_PATH: &str = "/players/marcel-schneider-35703/news";

/// Path of the Discord webhook on the mock server
pub const WEBHOOK_PATH: &str = "/api/webhooks/1/token";

/// Payload shaped like the site's Next.js data: nested, with one
/// malformed entry and one duplicate carrying a later date
pub fn sample_payload() -> Value {
    json!({
        "props": {
            "pageProps": {
                "player": { "name": "Marcel Schneider", "id": 35703 },
                "news": {
                    "items": [
                        {
                            "id": "article-2",
                            "title": "Schneider climbs into contention",
                            "url": "/dpworld-tour/news/articles/detail/schneider-climbs/",
                            "publishDateTime": "2024-03-05T10:30:00Z",
                            "summary": "  A bogey-free 66 on Friday.  "
                        },
                        {
                            "id": "article-1",
                            "headline": "Schneider opens season",
                            "permalink": "https://www.europeantour.com/news/opens-season",
                            "publishDate": "2024-01-20T08:00:00+01:00"
                        },
                        {
                            "id": "broken",
                            "title": "No date on this one",
                            "url": "/news/broken",
                            "date": "sometime soon"
                        }
                    ],
                    "related": [
                        {
                            "id": "article-1",
                            "title": "Schneider opens season (updated)",
                            "url": "/news/opens-season",
                            "publishDate": "2024-01-21T09:00:00Z"
                        }
                    ]
                }
            }
        },
        "page": "/players/[slug]/news",
        "buildId": "abc123"
    })
}

/// Wrap a payload into a page carrying the `__NEXT_DATA__` marker
pub fn news_page(payload: &Value) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Marcel Schneider | DP World Tour</title></head>
<body>
<div id="__next"></div>
<script id="__NEXT_DATA__" type="application/json">{payload}</script>
</body>
</html>"#
    )
}

/// A page without the payload marker, as served by a block page
pub fn challenge_page() -> String {
    "<html><body><h1>Checking your browser…</h1></body></html>".to_string()
}

pub fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

/// Create a record with specific identifier and day in March 2024
pub fn record(id: &str, day: u32) -> NewsRecord {
    NewsRecord {
        identifier: id.to_string(),
        title: format!("Article {id}"),
        url: format!("https://www.europeantour.com/news/{id}"),
        summary: Some(format!("Summary of {id}")),
        published: at(2024, 3, day, 9),
    }
}

/// Fetch configuration aimed at a mock server, with no delays
pub fn fetch_config(server_uri: &str, primary_attempts: u32, fallback_attempts: u32) -> FetchConfig {
    FetchConfig {
        target_url: format!("{server_uri}{NEWS_PATH}"),
        base_url: "https://www.europeantour.com".to_string(),
        request_timeout_secs: 5,
        max_attempts: 3,
        strategies: vec![
            StrategySettings {
                kind: StrategyKind::PrimaryClient,
                max_attempts: Some(primary_attempts),
                enabled: true,
            },
            StrategySettings {
                kind: StrategyKind::FallbackClient,
                max_attempts: Some(fallback_attempts),
                enabled: true,
            },
        ],
        warm_up: true,
        warm_up_jitter_min_ms: 0,
        warm_up_jitter_max_ms: 0,
        retry: RetryConfig::immediate(),
    }
}

/// Full configuration for end-to-end runs
///
/// Only the reqwest fallback client is configured so runs behave the same
/// with or without browser emulation compiled in.
pub fn config(server_uri: &str, dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.fetch = fetch_config(server_uri, 1, 1);
    config.fetch.strategies.remove(0);
    config.archive.database_path = dir.join("news_archive.sqlite3");
    config.archive.ledger_path = Some(dir.join("archive/news_archive.jsonl"));
    config.notifier.webhook_url = Some(format!("{server_uri}{WEBHOOK_PATH}"));
    config.notifier.max_retries = 0;
    config.monitor.interval_secs = 0;
    config
}
