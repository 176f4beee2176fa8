//! Error handling and processing statistics.
//!
//! This module provides:
//! - Error type definitions (`ScrapeError`, `ConfigError`, ...)
//! - Failure classification into retry categories
//! - Per-category retry policies with jittered backoff
//! - Processing statistics tracking
//!
//! Only configuration errors abort a run. Attempt failures are classified,
//! retried per policy, and finally written to the failure log.

mod categorization;
mod policy;
mod stats;
mod types;

// Re-export public API
pub use categorization::{classify, classify_error, ErrorCategory};
pub use policy::{retry_decision, RetryDecision, RetryPolicy, RETRY_JITTER_FRACTION};
pub use stats::ProcessingStats;
pub use types::{
    ConfigError, InitializationError, ScrapeError, UnhandledMultiplierError,
};
