//! Fetch strategies
//!
//! A strategy performs exactly one attempt: an optional warm-up request to
//! the site root, a short pause, then the target request. Retrying,
//! backoff and fallback ordering belong to [`super::FetchEngine`].

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use super::headers::{build_browser_headers, Fingerprint, FALLBACK_FINGERPRINTS, PRIMARY_FINGERPRINTS};
use crate::config::FetchConfig;
use crate::models::StrategyKind;
use crate::utils::error::{FailureReason, FetchError};

/// Warm-up request made before the target within the same session
#[derive(Debug, Clone, Copy)]
pub struct WarmUp<'a> {
    pub url: &'a str,
    /// Pause between the warm-up and the target request
    pub pause: Duration,
}

/// Everything one attempt needs
#[derive(Debug, Clone, Copy)]
pub struct AttemptPlan<'a> {
    pub target: &'a str,
    pub fingerprint: &'a Fingerprint,
    pub warm_up: Option<WarmUp<'a>>,
}

/// A way of retrieving the target page
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Client identities this strategy rotates through; never empty
    fn fingerprints(&self) -> &'static [Fingerprint];

    /// Attempts this strategy gets before the engine moves on
    fn max_attempts(&self) -> u32;

    /// Perform a single attempt and return the body on status < 400
    async fn fetch_once(&self, plan: AttemptPlan<'_>) -> Result<String, FailureReason>;
}

/// reqwest-backed strategy
///
/// A fresh client (and cookie jar) is built per attempt so every attempt
/// is an independent browser session. The header fingerprint follows
/// `kind`, but the TLS handshake is always reqwest's own; only
/// `EmulatedStrategy` matches a browser below the HTTP layer. The
/// configured fallback speaks HTTP/1.1.
pub struct HttpStrategy {
    kind: StrategyKind,
    timeout: Duration,
    max_attempts: u32,
}

impl HttpStrategy {
    /// Create a strategy, verifying that its client can be constructed
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Client` when the client cannot be built on this
    /// host (for example a TLS backend failure)
    pub fn new(kind: StrategyKind, timeout: Duration, max_attempts: u32) -> Result<Self, FetchError> {
        let strategy = Self {
            kind,
            timeout,
            max_attempts,
        };
        strategy.session()?;
        Ok(strategy)
    }

    fn session(&self) -> Result<Client, reqwest::Error> {
        let builder = Client::builder()
            .timeout(self.timeout)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .deflate(true);

        let builder = match self.kind {
            StrategyKind::PrimaryClient => builder.http2_adaptive_window(true),
            StrategyKind::FallbackClient => builder.http1_only(),
        };

        builder.build()
    }
}

#[async_trait]
impl FetchStrategy for HttpStrategy {
    fn kind(&self) -> StrategyKind {
        self.kind
    }

    fn fingerprints(&self) -> &'static [Fingerprint] {
        fingerprints_for(self.kind)
    }

    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    async fn fetch_once(&self, plan: AttemptPlan<'_>) -> Result<String, FailureReason> {
        let client = self
            .session()
            .map_err(|e| FailureReason::Transport(e.to_string()))?;

        let referer = if let Some(warm_up) = plan.warm_up {
            let result = client
                .get(warm_up.url)
                .headers(build_browser_headers(plan.fingerprint, None))
                .send()
                .await
                .map(|response| response.status().as_u16());
            log_warm_up(self.kind, result);
            tokio::time::sleep(warm_up.pause).await;
            Some(warm_up.url)
        } else {
            None
        };

        let response = client
            .get(plan.target)
            .headers(build_browser_headers(plan.fingerprint, referer))
            .send()
            .await
            .map_err(|e| FailureReason::from_transport(&e))?;

        let status = response.status().as_u16();
        if status >= 400 {
            return Err(FailureReason::from_status(status));
        }

        response
            .text()
            .await
            .map_err(|e| FailureReason::from_transport(&e))
    }
}

/// Chrome-emulating strategy backed by wreq
///
/// The client reproduces Chrome's TLS ClientHello, HTTP/2 settings and
/// header order, so the primary attempt looks like a real browser to
/// fingerprinting middleboxes. Only compiled with the `impersonate` feature.
#[cfg(feature = "impersonate")]
pub struct EmulatedStrategy {
    timeout: Duration,
    max_attempts: u32,
}

#[cfg(feature = "impersonate")]
impl EmulatedStrategy {
    /// Browser profile the client emulates
    pub const EMULATION: wreq_util::Emulation = wreq_util::Emulation::Chrome131;

    /// Create the strategy, verifying that the emulating client can start
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Unavailable` when the client cannot be built
    pub fn new(timeout: Duration, max_attempts: u32) -> Result<Self, FetchError> {
        let strategy = Self {
            timeout,
            max_attempts,
        };
        strategy
            .session()
            .map_err(|e| FetchError::Unavailable {
                strategy: StrategyKind::PrimaryClient,
                reason: e.to_string(),
            })?;
        Ok(strategy)
    }

    fn session(&self) -> Result<wreq::Client, wreq::Error> {
        wreq::Client::builder()
            .emulation(Self::EMULATION)
            .timeout(self.timeout)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
    }
}

#[cfg(feature = "impersonate")]
fn emulated_failure(err: &wreq::Error) -> FailureReason {
    if err.is_timeout() {
        FailureReason::Timeout
    } else {
        FailureReason::Transport(err.to_string())
    }
}

#[cfg(feature = "impersonate")]
#[async_trait]
impl FetchStrategy for EmulatedStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::PrimaryClient
    }

    fn fingerprints(&self) -> &'static [Fingerprint] {
        PRIMARY_FINGERPRINTS
    }

    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    async fn fetch_once(&self, plan: AttemptPlan<'_>) -> Result<String, FailureReason> {
        let client = self
            .session()
            .map_err(|e| FailureReason::Transport(e.to_string()))?;

        let referer = if let Some(warm_up) = plan.warm_up {
            let result = client
                .get(warm_up.url)
                .headers(build_browser_headers(plan.fingerprint, None))
                .send()
                .await
                .map(|response| response.status().as_u16());
            log_warm_up(StrategyKind::PrimaryClient, result);
            tokio::time::sleep(warm_up.pause).await;
            Some(warm_up.url)
        } else {
            None
        };

        let response = client
            .get(plan.target)
            .headers(build_browser_headers(plan.fingerprint, referer))
            .send()
            .await
            .map_err(|e| emulated_failure(&e))?;

        let status = response.status().as_u16();
        if status >= 400 {
            return Err(FailureReason::from_status(status));
        }

        response.text().await.map_err(|e| emulated_failure(&e))
    }
}

fn fingerprints_for(kind: StrategyKind) -> &'static [Fingerprint] {
    match kind {
        StrategyKind::PrimaryClient => PRIMARY_FINGERPRINTS,
        StrategyKind::FallbackClient => FALLBACK_FINGERPRINTS,
    }
}

// A failed warm-up only costs us the session cookies
fn log_warm_up<E: std::fmt::Display>(kind: StrategyKind, result: Result<u16, E>) {
    match result {
        Ok(status) => debug!(strategy = %kind, status, "Warm-up request completed"),
        Err(e) => warn!(strategy = %kind, error = %e, "Warm-up request failed"),
    }
}

/// Build the browser-emulating primary strategy
///
/// # Errors
///
/// Returns `FetchError::Unavailable` when the crate was built without the
/// `impersonate` feature or the emulating client cannot start
#[cfg(feature = "impersonate")]
pub fn primary_strategy(timeout: Duration, max_attempts: u32) -> Result<Box<dyn FetchStrategy>, FetchError> {
    Ok(Box::new(EmulatedStrategy::new(timeout, max_attempts)?))
}

/// Build the browser-emulating primary strategy
///
/// # Errors
///
/// Returns `FetchError::Unavailable` when the crate was built without the
/// `impersonate` feature or the emulating client cannot start
#[cfg(not(feature = "impersonate"))]
pub fn primary_strategy(_timeout: Duration, _max_attempts: u32) -> Result<Box<dyn FetchStrategy>, FetchError> {
    Err(FetchError::Unavailable {
        strategy: StrategyKind::PrimaryClient,
        reason: "built without the `impersonate` feature".to_string(),
    })
}

/// Build the configured strategies in priority order
///
/// Disabled strategies are left out. A strategy whose client is missing or
/// cannot be constructed is skipped with a warning instead of failing the
/// run.
pub fn build_strategies(config: &FetchConfig) -> Vec<Box<dyn FetchStrategy>> {
    let timeout = config.request_timeout();
    let mut strategies: Vec<Box<dyn FetchStrategy>> = Vec::new();

    for settings in &config.strategies {
        if !settings.enabled {
            debug!(strategy = %settings.kind, "Strategy disabled by configuration");
            continue;
        }

        let attempts = config.attempts_for(settings);
        let built = match settings.kind {
            StrategyKind::PrimaryClient => primary_strategy(timeout, attempts),
            StrategyKind::FallbackClient => HttpStrategy::new(settings.kind, timeout, attempts)
                .map(|s| Box::new(s) as Box<dyn FetchStrategy>),
        };

        match built {
            Ok(strategy) => strategies.push(strategy),
            Err(e) => {
                warn!(strategy = %settings.kind, error = %e, "Strategy unavailable, skipping");
            }
        }
    }

    strategies
}
