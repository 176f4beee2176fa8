//! Configuration types.
//!
//! This module defines the library-level `Config` (no CLI dependencies) and the
//! enums shared with the command line.

use std::fmt::Display;
use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;
use log::warn;

use crate::config::constants::*;
use crate::error_handling::ConfigError;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Page loader used to visit channel pages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BrowserKind {
    /// Plain HTTP fetch with inline-script parsing (no JavaScript)
    Http,
    /// Headless Chromium (requires the `browser` feature)
    Chromium,
}

/// Library configuration (no CLI dependencies).
///
/// # Examples
///
/// ```no_run
/// use channel_scout::Config;
///
/// let config = Config {
///     urls: vec!["@SomeHandle".to_string()],
///     max_concurrency: 3,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Search keywords; each yields up to `results_per_keyword` channels
    pub keywords: Vec<String>,

    /// Channels taken per keyword
    pub results_per_keyword: usize,

    /// Direct channel URLs or `@handle`s
    pub urls: Vec<String>,

    /// Bulk import file (CSV, TSV, text or JSON)
    pub bulk_file: Option<PathBuf>,

    /// Per-attempt wall-clock budget in seconds
    pub attempt_timeout_secs: u64,

    /// Cap on every category's retry budget
    pub max_retries: u32,

    /// Concurrent attempts allowed at start
    pub min_concurrency: usize,

    /// Concurrent attempts allowed once the success rate holds
    pub max_concurrency: usize,

    /// Upper bound on identifiers processed in one run
    pub max_identifiers: usize,

    /// Proxy URLs, one network identity each
    pub proxies: Vec<String>,

    /// Refuse to start without proxies
    pub proxy_required: bool,

    /// Keep records whose name could not be extracted
    pub save_partial_results: bool,

    /// Start at this channel URL, skipping the identifiers before it
    pub resume_from: Option<String>,

    /// JSONL file for channel records
    pub output: PathBuf,

    /// JSONL file for terminal failures
    pub failed_log: PathBuf,

    /// Directory for failure snapshots (screenshot + markup)
    pub snapshot_dir: Option<PathBuf>,

    /// Page loader
    pub browser: BrowserKind,

    /// Run Chromium without a window
    pub headless: bool,

    /// HTTP User-Agent header value
    pub user_agent: String,

    /// Pacing floor in milliseconds
    pub rate_min_delay_ms: u64,

    /// Pacing ceiling in milliseconds
    pub rate_max_delay_ms: u64,

    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keywords: Vec::new(),
            results_per_keyword: RESULTS_PER_KEYWORD.default,
            urls: Vec::new(),
            bulk_file: None,
            attempt_timeout_secs: ATTEMPT_TIMEOUT_SECS.default,
            max_retries: MAX_RETRIES.default,
            min_concurrency: MIN_CONCURRENCY.default,
            max_concurrency: MAX_CONCURRENCY.default,
            max_identifiers: MAX_IDENTIFIERS.default,
            proxies: Vec::new(),
            proxy_required: false,
            save_partial_results: true,
            resume_from: None,
            output: PathBuf::from(DEFAULT_OUTPUT_PATH),
            failed_log: PathBuf::from(DEFAULT_FAILED_LOG_PATH),
            snapshot_dir: None,
            browser: BrowserKind::Http,
            headless: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            rate_min_delay_ms: RATE_MIN_DELAY_MS.default,
            rate_max_delay_ms: RATE_MAX_DELAY_MS.default,
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
        }
    }
}

/// Clamps `value` into `range`, warning when it had to move.
pub fn clamp_option<T>(value: T, range: &OptionRange<T>) -> T
where
    T: PartialOrd + Copy + Display,
{
    let clamped = if value < range.min {
        range.min
    } else if value > range.max {
        range.max
    } else {
        value
    };
    if clamped != value {
        warn!(
            "Option {}={} is outside [{}, {}]; using {}",
            range.name, value, range.min, range.max, clamped
        );
    }
    clamped
}

impl Config {
    /// Clamps numeric options and checks startup invariants.
    ///
    /// # Errors
    ///
    /// - `ConfigError::ProxyRequired` if proxies are required but none are set
    /// - `ConfigError::NoInput` if there are no keywords, URLs or bulk file
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.results_per_keyword = clamp_option(self.results_per_keyword, &RESULTS_PER_KEYWORD);
        self.attempt_timeout_secs = clamp_option(self.attempt_timeout_secs, &ATTEMPT_TIMEOUT_SECS);
        self.max_retries = clamp_option(self.max_retries, &MAX_RETRIES);
        self.min_concurrency = clamp_option(self.min_concurrency, &MIN_CONCURRENCY);
        self.max_concurrency = clamp_option(self.max_concurrency, &MAX_CONCURRENCY);
        self.max_identifiers = clamp_option(self.max_identifiers, &MAX_IDENTIFIERS);
        self.rate_min_delay_ms = clamp_option(self.rate_min_delay_ms, &RATE_MIN_DELAY_MS);
        self.rate_max_delay_ms = clamp_option(self.rate_max_delay_ms, &RATE_MAX_DELAY_MS);

        if self.min_concurrency > self.max_concurrency {
            warn!(
                "min_concurrency={} exceeds max_concurrency={}; using {}",
                self.min_concurrency, self.max_concurrency, self.max_concurrency
            );
            self.min_concurrency = self.max_concurrency;
        }
        if self.rate_min_delay_ms > self.rate_max_delay_ms {
            warn!(
                "rate_min_delay_ms={} exceeds rate_max_delay_ms={}; using {}",
                self.rate_min_delay_ms, self.rate_max_delay_ms, self.rate_max_delay_ms
            );
            self.rate_min_delay_ms = self.rate_max_delay_ms;
        }

        self.proxies.retain(|p| !p.trim().is_empty());
        if self.proxy_required && self.proxies.is_empty() {
            return Err(ConfigError::ProxyRequired);
        }

        let has_keywords = self.keywords.iter().any(|k| !k.trim().is_empty());
        if !has_keywords && self.urls.is_empty() && self.bulk_file.is_none() {
            return Err(ConfigError::NoInput);
        }
        Ok(())
    }

    /// Per-attempt timeout as a `Duration`.
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }
}
