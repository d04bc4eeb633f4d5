//! Retry policy with exponential backoff
//!
//! The connector normally relies on its upload interval instead of retrying:
//! a failed cycle is simply repeated at the next tick. A retry policy lets a
//! single cycle ride out short network hiccups when that is preferred.
//!
//! # Example
//!
//! ```rust
//! use ofeed_core::retry::RetryConfig;
//! use std::time::Duration;
//!
//! let config = RetryConfig { jitter: false, ..RetryConfig::default() };
//! assert_eq!(config.delay_for_attempt(2), Duration::from_millis(1000));
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Add up to 25% random jitter to delays
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a config for quick retries
    #[must_use]
    pub fn quick() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_millis(500),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }

    /// Create a config with no retries
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            jitter: false,
        }
    }

    /// Default backoff with a specific number of attempts
    ///
    /// Zero is treated as one attempt.
    #[must_use]
    pub fn with_attempts(attempts: u32) -> Self {
        if attempts <= 1 {
            return Self::no_retry();
        }
        Self {
            max_attempts: attempts,
            ..Self::default()
        }
    }

    /// Calculate delay for a given attempt
    #[must_use]
    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let base_delay =
            self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(attempt as i32 - 1);

        let delay_secs = base_delay.min(self.max_delay.as_secs_f64());

        let final_delay = if self.jitter {
            let jitter_factor = 1.0 + (rand_simple() * 0.25);
            delay_secs * jitter_factor
        } else {
            delay_secs
        };

        Duration::from_secs_f64(final_delay)
    }
}

/// Simple pseudo-random number generator (0.0 to 1.0)
#[allow(clippy::cast_precision_loss)]
fn rand_simple() -> f64 {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    let mut hasher = RandomState::new().build_hasher();
    hasher.write_u128(
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default(),
    );
    (hasher.finish() % 1000) as f64 / 1000.0
}
