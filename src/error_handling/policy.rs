//! Per-category retry policies.
//!
//! Each category has a bounded exponential backoff schedule. Delays are capped
//! and then receive positive jitter so that retries from concurrent workers do
//! not line up.

use std::time::Duration;

use rand::Rng;

use super::categorization::ErrorCategory;

/// Maximum jitter added on top of the computed delay, as a fraction of it.
pub const RETRY_JITTER_FRACTION: f64 = 0.3;

/// Backoff schedule for one error category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Number of retries after the first failed attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound for the un-jittered delay
    pub max_delay: Duration,
    /// Growth factor per retry
    pub backoff_multiplier: f64,
}

impl RetryPolicy {
    const fn new(max_retries: u32, initial_ms: u64, max_ms: u64, backoff_multiplier: f64) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::from_millis(initial_ms),
            max_delay: Duration::from_millis(max_ms),
            backoff_multiplier,
        }
    }

    /// Policy that never retries.
    const fn never() -> Self {
        Self::new(0, 0, 0, 1.0)
    }

    /// Returns the un-jittered delay before retry number `attempt` (zero-based).
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt.min(i32::MAX as u32) as i32);
        let millis = self.initial_delay.as_millis() as f64 * factor;
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped.max(0.0) as u64)
    }
}

impl ErrorCategory {
    /// Returns the retry policy for this category.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            ErrorCategory::RateLimit => RetryPolicy::new(5, 5_000, 60_000, 2.0),
            ErrorCategory::Timeout => RetryPolicy::new(3, 2_000, 10_000, 1.5),
            ErrorCategory::Network => RetryPolicy::new(3, 1_000, 5_000, 1.5),
            ErrorCategory::Captcha => RetryPolicy::never(),
            ErrorCategory::NotFound => RetryPolicy::never(),
            ErrorCategory::Consent => RetryPolicy::new(1, 1_000, 1_000, 1.0),
            ErrorCategory::Temporary => RetryPolicy::new(2, 3_000, 10_000, 2.0),
        }
    }
}

/// Outcome of consulting the retry policy after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RetryDecision {
    /// Re-enqueue after the given delay.
    Retry {
        /// Delay before the retry becomes eligible for dequeue
        delay: Duration,
    },
    /// Terminal failure: log it and move on.
    GiveUp,
}

/// Decides whether a failed attempt should be retried.
///
/// # Arguments
///
/// * `category` - Classified failure category
/// * `attempt` - Zero-based retry index (0 for the first failure)
/// * `retry_cap` - Operator-level cap applied on top of the category budget
///
/// # Returns
///
/// `Retry` with a jittered delay while the budget lasts, else `GiveUp`.
pub fn retry_decision(category: ErrorCategory, attempt: u32, retry_cap: u32) -> RetryDecision {
    let policy = category.retry_policy();
    let budget = policy.max_retries.min(retry_cap);
    if attempt >= budget {
        return RetryDecision::GiveUp;
    }

    let base = policy.base_delay(attempt);
    let jitter = rand::rng().random_range(0.0..RETRY_JITTER_FRACTION);
    let delay = Duration::from_millis((base.as_millis() as f64 * (1.0 + jitter)) as u64);
    RetryDecision::Retry { delay }
}
