//! Backoff and jitter for the fetch retry loop
//!
//! Delays grow exponentially with the attempt index and carry random
//! jitter so that retries never line up into a synchronized burst. The
//! randomness source is injectable through [`Jitter`] so tests can run
//! deterministically.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Base delay in milliseconds for exponential backoff
    pub base_delay_ms: u64,

    /// Maximum delay in milliseconds (caps exponential growth)
    pub max_delay_ms: u64,

    /// Multiplier for exponential backoff (default: 2.0)
    pub backoff_multiplier: f64,

    /// Upper bound of the random jitter added to every backoff delay
    pub jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 2_000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
            jitter_ms: 1_500,
        }
    }
}

impl RetryConfig {
    /// Create a retry configuration with custom delays
    pub fn with_delays(base_delay_ms: u64, max_delay_ms: u64, jitter_ms: u64) -> Self {
        Self {
            base_delay_ms,
            max_delay_ms,
            backoff_multiplier: 2.0,
            jitter_ms,
        }
    }

    /// No waiting at all; used by tests and dry runs against local mocks
    pub fn immediate() -> Self {
        Self::with_delays(0, 0, 0)
    }

    /// Deterministic part of the delay before `attempt` (0-based)
    ///
    /// The first attempt never waits.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let delay_ms = if attempt == 0 {
            0
        } else {
            let exponential =
                self.base_delay_ms as f64 * self.backoff_multiplier.powi((attempt - 1) as i32);
            (exponential as u64).min(self.max_delay_ms)
        };

        Duration::from_millis(delay_ms)
    }

    /// Full delay before `attempt`: backoff plus jitter
    pub fn delay_for(&self, attempt: u32, jitter: &dyn Jitter) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        self.backoff(attempt) + jitter.between(Duration::ZERO, Duration::from_millis(self.jitter_ms))
    }
}

/// Source of randomness for delays and fingerprint selection
pub trait Jitter: Send + Sync {
    /// A duration in `[min, max]`
    fn between(&self, min: Duration, max: Duration) -> Duration;

    /// An index in `0..len`; `len` is never zero
    fn pick(&self, len: usize) -> usize;
}

/// Thread-local RNG backed jitter
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomJitter;

impl Jitter for RandomJitter {
    fn between(&self, min: Duration, max: Duration) -> Duration {
        if max <= min {
            return min;
        }
        let ms = rand::thread_rng().gen_range(min.as_millis() as u64..=max.as_millis() as u64);
        Duration::from_millis(ms)
    }

    fn pick(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len.max(1))
    }
}

/// Jitter that always returns the lower bound and the first index
#[derive(Debug, Default, Clone, Copy)]
pub struct NoJitter;

impl Jitter for NoJitter {
    fn between(&self, min: Duration, _max: Duration) -> Duration {
        min
    }

    fn pick(&self, _len: usize) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_growth() {
        let config = RetryConfig::with_delays(1000, 30_000, 0);

        assert_eq!(config.backoff(0), Duration::from_millis(0));
        assert_eq!(config.backoff(1), Duration::from_millis(1000));
        assert_eq!(config.backoff(2), Duration::from_millis(2000));
        assert_eq!(config.backoff(3), Duration::from_millis(4000));
    }

    #[test]
    fn test_max_delay_cap() {
        let config = RetryConfig::with_delays(1000, 5000, 0);

        assert_eq!(config.backoff(10), Duration::from_millis(5000));
    }

    #[test]
    fn test_first_attempt_has_no_jitter() {
        let config = RetryConfig::with_delays(1000, 5000, 800);
        assert_eq!(config.delay_for(0, &RandomJitter), Duration::ZERO);
    }

    #[test]
    fn test_jitter_stays_in_bounds() {
        let config = RetryConfig::with_delays(100, 10_000, 50);

        for _ in 0..200 {
            let delay = config.delay_for(2, &RandomJitter);
            assert!(delay >= Duration::from_millis(200));
            assert!(delay <= Duration::from_millis(250));
        }
    }

    #[test]
    fn test_no_jitter_is_deterministic() {
        let config = RetryConfig::with_delays(100, 10_000, 50);
        assert_eq!(config.delay_for(3, &NoJitter), Duration::from_millis(400));
        assert_eq!(NoJitter.pick(7), 0);
    }

    #[test]
    fn test_random_pick_in_range() {
        for _ in 0..100 {
            assert!(RandomJitter.pick(4) < 4);
        }
        assert_eq!(RandomJitter.pick(1), 0);
    }
}
