//! Error type definitions.
//!
//! This module defines the error types raised while configuring, crawling and
//! extracting channel pages.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// Error launching or connecting to the browser runtime.
    #[error("Browser initialization error: {0}")]
    BrowserError(String),
}

/// Fatal configuration problems detected before the crawl starts.
///
/// These are the only errors that abort a run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// None of the input sources (URLs, bulk import, keywords) yielded anything.
    #[error("configuration error: no input provided (supply URLs, a bulk import file, or search keywords)")]
    NoInput,

    /// Proxies are marked as required but none were configured.
    #[error("configuration error: a proxy is required but no proxy URLs were configured")]
    ProxyRequired,

    /// An option value could not be interpreted at all (clamping only handles numbers).
    #[error("configuration error: invalid value {value:?} for option '{name}'")]
    InvalidOption {
        /// Option name as it appears in the input
        name: String,
        /// Offending raw value
        value: String,
    },

    /// The bulk import file uses a format that has no reader.
    #[error("configuration error: unsupported bulk import format '{0}'")]
    UnsupportedBulkFormat(String),

    /// The bulk import or input file could not be read.
    #[error("configuration error: cannot read {path}: {reason}")]
    UnreadableFile {
        /// Path of the file
        path: String,
        /// Underlying I/O or parse failure
        reason: String,
    },
}

/// A compact count carried a multiplier letter outside K/M/B/T/Q.
///
/// This is the one decoding failure that is surfaced instead of degrading to a
/// default: an unknown suffix would otherwise silently corrupt counts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unhandled count multiplier '{multiplier}' in {text:?}")]
pub struct UnhandledMultiplierError {
    /// The offending letter
    pub multiplier: char,
    /// The full text being decoded
    pub text: String,
}

/// Failure of a single crawl attempt.
///
/// The classifier maps variants directly; only the free-text detail of
/// `Network` and `Browser` is inspected for keywords.
#[derive(Error, Debug, Clone)]
pub enum ScrapeError {
    /// The page presented a CAPTCHA challenge.
    #[error("CAPTCHA challenge detected at {url}")]
    CaptchaDetected {
        /// Page URL at detection time
        url: String,
    },

    /// A consent interstitial was shown and could not be dismissed.
    #[error("consent interstitial could not be dismissed at {url}")]
    ConsentBlocked {
        /// Page URL at detection time
        url: String,
    },

    /// Navigation returned a non-success HTTP status.
    #[error("HTTP {status} for {url}")]
    HttpStatus {
        /// Response status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// The attempt exceeded its wall-clock budget.
    #[error("attempt timed out after {0}s")]
    Timeout(u64),

    /// Transport-level failure (DNS, TCP, TLS, proxy).
    #[error("network error: {0}")]
    Network(String),

    /// Browser runtime failure (crashed page, protocol error).
    #[error("browser error: {0}")]
    Browser(String),

    /// Extraction produced only placeholder data and partial results are disabled.
    #[error("partial result rejected for {url}")]
    PartialResult {
        /// Channel URL
        url: String,
    },

    /// A count used an unknown multiplier suffix.
    #[error(transparent)]
    UnhandledMultiplier(#[from] UnhandledMultiplierError),
}

impl ScrapeError {
    /// Returns the HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ScrapeError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if this error means the current network identity is burned.
    pub fn requires_session_rotation(&self) -> bool {
        matches!(self, ScrapeError::CaptchaDetected { .. })
    }
}

impl From<ReqwestError> for ScrapeError {
    fn from(e: ReqwestError) -> Self {
        if e.is_timeout() {
            // The classifier reads the detail of network errors for "timeout"
            ScrapeError::Network(format!("request timeout: {e}"))
        } else if let Some(status) = e.status() {
            ScrapeError::HttpStatus {
                status: status.as_u16(),
                url: e.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else {
            ScrapeError::Network(format!("connection failed: {e}"))
        }
    }
}
