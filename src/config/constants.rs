//! Configuration constants.
//!
//! Defaults and accepted ranges for every operator option, plus a few
//! operational intervals. Numeric options outside their range are clamped.

use std::time::Duration;

/// An accepted `[min, max]` range with the default used when the option is unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionRange<T> {
    /// Option name as shown in warnings
    pub name: &'static str,
    pub min: T,
    pub max: T,
    pub default: T,
}

pub const RESULTS_PER_KEYWORD: OptionRange<usize> = OptionRange {
    name: "results_per_keyword",
    min: 1,
    max: 100,
    default: 20,
};

/// Per-attempt wall-clock budget, in seconds.
pub const ATTEMPT_TIMEOUT_SECS: OptionRange<u64> = OptionRange {
    name: "attempt_timeout_secs",
    min: 5,
    max: 300,
    default: 30,
};

/// Operator cap on every category's retry budget.
pub const MAX_RETRIES: OptionRange<u32> = OptionRange {
    name: "max_retries",
    min: 0,
    max: 10,
    default: 5,
};

pub const MIN_CONCURRENCY: OptionRange<usize> = OptionRange {
    name: "min_concurrency",
    min: 1,
    max: 50,
    default: 1,
};

pub const MAX_CONCURRENCY: OptionRange<usize> = OptionRange {
    name: "max_concurrency",
    min: 1,
    max: 50,
    default: 5,
};

/// Upper bound on identifiers processed in one run.
pub const MAX_IDENTIFIERS: OptionRange<usize> = OptionRange {
    name: "max_identifiers",
    min: 1,
    max: 10_000,
    default: 1_000,
};

/// Inter-request pacing floor, in milliseconds.
pub const RATE_MIN_DELAY_MS: OptionRange<u64> = OptionRange {
    name: "rate_min_delay_ms",
    min: 0,
    max: 60_000,
    default: 1_000,
};

/// Inter-request pacing ceiling, in milliseconds.
pub const RATE_MAX_DELAY_MS: OptionRange<u64> = OptionRange {
    name: "rate_max_delay_ms",
    min: 100,
    max: 300_000,
    default: 15_000,
};

/// Default output file for channel records.
pub const DEFAULT_OUTPUT_PATH: &str = "channels.jsonl";

/// Default terminal-failure log.
pub const DEFAULT_FAILED_LOG_PATH: &str = "failed_requests.jsonl";

/// Progress is logged this often.
pub const LOGGING_INTERVAL: Duration = Duration::from_secs(5);

/// Default User-Agent for the HTTP page loader and search client.
///
/// Users can override this via the `--user-agent` CLI flag.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Connect timeout for the HTTP client; the attempt timeout bounds the rest.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// HTTP status codes
pub const HTTP_STATUS_NOT_FOUND: u16 = 404;
pub const HTTP_STATUS_TOO_MANY_REQUESTS: u16 = 429;
