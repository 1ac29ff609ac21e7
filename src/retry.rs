//! Backoff policy for retrying status writes that lost an optimistic
//! concurrency race.
//!
//! The updater drives its own fetch/mutate/write loop and asks a [`Backoff`]
//! how long to wait before the next attempt. Delays grow exponentially, are
//! capped at `max_delay`, and carry jitter so racing writers spread out.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use lattice_work::retry::{Backoff, RetryConfig};
//!
//! let config = RetryConfig {
//!     max_attempts: 3,
//!     initial_delay: Duration::from_millis(10),
//!     max_delay: Duration::from_millis(100),
//!     backoff_multiplier: 2.0,
//! };
//! let mut backoff = Backoff::new(&config);
//! assert!(backoff.next_delay().is_some()); // after attempt 1
//! assert!(backoff.next_delay().is_some()); // after attempt 2
//! assert!(backoff.next_delay().is_none()); // attempt 3 was the last
//! ```

use std::time::Duration;

use rand::Rng;

/// Retry policy for conflicting status writes.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of write attempts (0 = infinite)
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub initial_delay: Duration,
    /// Maximum delay between attempts
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_secs(1),
            backoff_multiplier: 5.0,
        }
    }
}

impl RetryConfig {
    /// Create a config with a maximum number of attempts
    pub fn with_max_attempts(attempts: u32) -> Self {
        Self {
            max_attempts: attempts,
            ..Default::default()
        }
    }

    /// Create a config that retries forever (infinite attempts)
    pub fn infinite() -> Self {
        Self::with_max_attempts(0)
    }

    /// Returns true if `attempt` (1-based) is the last one allowed
    pub fn is_last_attempt(&self, attempt: u32) -> bool {
        self.max_attempts > 0 && attempt >= self.max_attempts
    }
}

/// Stateful delay sequence for one retry loop.
#[derive(Debug)]
pub struct Backoff {
    config: RetryConfig,
    attempt: u32,
    delay: Duration,
}

impl Backoff {
    /// Start a fresh sequence for the given policy
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            config: config.clone(),
            attempt: 0,
            delay: config.initial_delay,
        }
    }

    /// Number of attempts recorded so far
    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    /// Record a failed attempt and return how long to wait before the next
    /// one, or `None` once the policy is exhausted.
    pub fn next_delay(&mut self) -> Option<Duration> {
        self.attempt += 1;
        if self.config.is_last_attempt(self.attempt) {
            return None;
        }

        // Add jitter: 0.5x to 1.5x of the delay
        let jitter = rand::thread_rng().gen_range(0.5..1.5);
        let jittered = Duration::from_secs_f64(self.delay.as_secs_f64() * jitter);

        // Exponential backoff, capped at max_delay. A multiplier below 1
        // (or NaN) keeps the delay flat instead of shrinking it.
        let multiplier = self.config.backoff_multiplier.max(1.0);
        self.delay = Duration::from_secs_f64(
            (self.delay.as_secs_f64() * multiplier).min(self.config.max_delay.as_secs_f64()),
        );

        Some(jittered.min(self.config.max_delay))
    }
}
