//! Resilient retrieval of the player news page
//!
//! The target site runs bot detection, so [`FetchEngine`] walks an ordered
//! list of strategies. Each strategy gets its own attempt budget; every
//! attempt draws a fresh client identity, warms up against the site root
//! and pauses a random interval before requesting the page. Attempts run
//! strictly one at a time.

pub mod headers;
pub mod strategy;

pub use strategy::{
    build_strategies, primary_strategy, AttemptPlan, FetchStrategy, HttpStrategy, WarmUp,
};

#[cfg(feature = "impersonate")]
pub use strategy::EmulatedStrategy;

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::FetchConfig;
use crate::error::Error;
use crate::models::{AttemptOutcome, FetchAttempt, StrategyKind};
use crate::parser::{locate_payload, url::site_root};
use crate::utils::error::{FailureReason, FetchError};
use crate::utils::retry::{Jitter, RandomJitter, RetryConfig};

/// A retrieved page plus the attempts it took
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub body: String,
    /// Strategy that produced the body
    pub strategy: StrategyKind,
    /// Every attempt made during this call, in order
    pub attempts: Vec<FetchAttempt>,
}

/// A retrieved page with its decoded data payload
#[derive(Debug, Clone)]
pub struct FetchedPayload {
    pub payload: Value,
    pub page: FetchedPage,
}

/// Ordered multi-strategy fetcher
pub struct FetchEngine {
    strategies: Vec<Box<dyn FetchStrategy>>,
    retry: RetryConfig,
    warm_up: bool,
    warm_up_min: Duration,
    warm_up_max: Duration,
    jitter: Arc<dyn Jitter>,
}

impl FetchEngine {
    /// Create an engine over explicit strategies
    pub fn new(strategies: Vec<Box<dyn FetchStrategy>>, retry: RetryConfig) -> Self {
        Self {
            strategies,
            retry,
            warm_up: true,
            warm_up_min: Duration::from_millis(800),
            warm_up_max: Duration::from_millis(2_500),
            jitter: Arc::new(RandomJitter),
        }
    }

    /// Build the engine from configuration, running capability detection
    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(build_strategies(config), config.retry.clone()).with_warm_up(
            config.warm_up,
            Duration::from_millis(config.warm_up_jitter_min_ms),
            Duration::from_millis(config.warm_up_jitter_max_ms),
        )
    }

    /// Configure the warm-up request and the pause that follows it
    #[must_use]
    pub fn with_warm_up(mut self, enabled: bool, min: Duration, max: Duration) -> Self {
        self.warm_up = enabled;
        self.warm_up_min = min;
        self.warm_up_max = max.max(min);
        self
    }

    /// Replace the randomness source
    #[must_use]
    pub fn with_jitter(mut self, jitter: Arc<dyn Jitter>) -> Self {
        self.jitter = jitter;
        self
    }

    /// Strategies that survived capability detection, in priority order
    pub fn strategy_kinds(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|s| s.kind()).collect()
    }

    /// Retrieve the raw HTML of `url`
    ///
    /// # Errors
    ///
    /// - `FetchError::InvalidUrl` if `url` has no usable origin
    /// - `FetchError::NoStrategy` if no strategy is available
    /// - `FetchError::Exhausted` with the last failure once every strategy
    ///   has spent its budget
    pub async fn fetch_html(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let root = site_root(url)?;
        let warm_up_url = self.warm_up.then_some(root.as_str());

        let mut attempts: Vec<FetchAttempt> = Vec::new();
        let mut last_failure: Option<FailureReason> = None;

        for strategy in &self.strategies {
            let kind = strategy.kind();
            let pool = strategy.fingerprints();
            if pool.is_empty() {
                warn!(strategy = %kind, "Strategy has no client identities, skipping");
                continue;
            }

            for attempt in 0..strategy.max_attempts() {
                let delay = self.retry.delay_for(attempt, self.jitter.as_ref());
                if !delay.is_zero() {
                    debug!(
                        strategy = %kind,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Backing off before retry"
                    );
                    tokio::time::sleep(delay).await;
                }

                let fingerprint = &pool[self.jitter.pick(pool.len()).min(pool.len() - 1)];
                let plan = AttemptPlan {
                    target: url,
                    fingerprint,
                    warm_up: warm_up_url.map(|warm| WarmUp {
                        url: warm,
                        pause: self.jitter.between(self.warm_up_min, self.warm_up_max),
                    }),
                };

                debug!(
                    url = %url,
                    strategy = %kind,
                    attempt = attempt + 1,
                    fingerprint = fingerprint.name,
                    "Fetching page"
                );

                match strategy.fetch_once(plan).await {
                    Ok(body) => {
                        attempts.push(FetchAttempt {
                            strategy: kind,
                            fingerprint: fingerprint.name,
                            outcome: AttemptOutcome::Success,
                        });
                        info!(
                            url = %url,
                            strategy = %kind,
                            attempts = attempts.len(),
                            bytes = body.len(),
                            "Page retrieved"
                        );
                        return Ok(FetchedPage {
                            body,
                            strategy: kind,
                            attempts,
                        });
                    }
                    Err(reason) => {
                        warn!(
                            url = %url,
                            strategy = %kind,
                            attempt = attempt + 1,
                            status = ?reason.status(),
                            reason = %reason,
                            "Fetch attempt failed"
                        );
                        attempts.push(FetchAttempt {
                            strategy: kind,
                            fingerprint: fingerprint.name,
                            outcome: AttemptOutcome::Failure(reason.clone()),
                        });
                        last_failure = Some(reason);
                    }
                }
            }

            info!(strategy = %kind, "Strategy exhausted");
        }

        match last_failure {
            Some(last) => Err(FetchError::Exhausted {
                url: url.to_string(),
                attempts: attempts.len(),
                last,
            }),
            None => Err(FetchError::NoStrategy {
                url: url.to_string(),
            }),
        }
    }

    /// Retrieve `url` and decode its embedded data payload
    ///
    /// A missing or malformed payload is terminal for this call; transport
    /// retries are not repeated for it.
    ///
    /// # Errors
    ///
    /// Returns `Error::Fetch` or `Error::Extraction`
    pub async fn fetch_payload(&self, url: &str) -> Result<FetchedPayload, Error> {
        let page = self.fetch_html(url).await?;
        let payload = locate_payload(&page.body)?;
        Ok(FetchedPayload { payload, page })
    }
}
