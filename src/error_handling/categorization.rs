//! Error categorization.
//!
//! Maps a failed attempt (message + optional HTTP status) onto the closed set of
//! categories that drive retry behaviour.

use std::fmt;

use strum_macros::EnumIter as EnumIterMacro;

use super::types::ScrapeError;
use crate::config::{HTTP_STATUS_NOT_FOUND, HTTP_STATUS_TOO_MANY_REQUESTS};

/// Failure categories, each with its own retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorCategory {
    /// HTTP 429 or a rate-limit message
    RateLimit,
    /// HTTP 404: the channel does not exist
    NotFound,
    /// Anything transient that is not otherwise recognized (5xx included)
    Temporary,
    /// CAPTCHA challenge
    Captcha,
    /// Consent interstitial could not be handled
    Consent,
    /// Attempt or navigation timeout
    Timeout,
    /// Transport-level failure
    Network,
}

impl ErrorCategory {
    /// Returns the string representation of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::RateLimit => "rate_limit",
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::Temporary => "temporary",
            ErrorCategory::Captcha => "captcha",
            ErrorCategory::Consent => "consent",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::Network => "network",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for ErrorCategory {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Classifies a failure from its message and the HTTP status, if one was seen.
///
/// Status codes take precedence over message inspection. Message checks are
/// case-insensitive and evaluated in a fixed order; the first hit wins.
///
/// # Arguments
///
/// * `message` - The error message (typically the error's `Display` output)
/// * `status` - HTTP status of the navigation response, if known
///
/// # Returns
///
/// The category; unrecognized failures are `Temporary`.
pub fn classify(message: &str, status: Option<u16>) -> ErrorCategory {
    match status {
        Some(HTTP_STATUS_TOO_MANY_REQUESTS) => return ErrorCategory::RateLimit,
        Some(HTTP_STATUS_NOT_FOUND) => return ErrorCategory::NotFound,
        Some(s) if s >= 500 => return ErrorCategory::Temporary,
        _ => {}
    }

    let msg = message.to_lowercase();
    if msg.contains("captcha") {
        ErrorCategory::Captcha
    } else if msg.contains("consent") {
        ErrorCategory::Consent
    } else if msg.contains("timeout") || msg.contains("timed out") {
        ErrorCategory::Timeout
    } else if msg.contains("network") || msg.contains("connection") {
        ErrorCategory::Network
    } else if msg.contains("too many requests") || msg.contains("rate limit") {
        ErrorCategory::RateLimit
    } else {
        ErrorCategory::Temporary
    }
}

/// Classifies a typed attempt error.
///
/// Typed variants map straight to their category. Only the free-text detail
/// of network and browser failures goes through [`classify`], so words inside
/// a channel URL never pick the category.
pub fn classify_error(error: &ScrapeError) -> ErrorCategory {
    match error {
        ScrapeError::CaptchaDetected { .. } => ErrorCategory::Captcha,
        ScrapeError::ConsentBlocked { .. } => ErrorCategory::Consent,
        ScrapeError::Timeout(_) => ErrorCategory::Timeout,
        ScrapeError::HttpStatus { status, .. } => classify("", Some(*status)),
        ScrapeError::Network(detail) => match classify(detail, None) {
            ErrorCategory::Temporary => ErrorCategory::Network,
            category => category,
        },
        ScrapeError::Browser(detail) => classify(detail, None),
        ScrapeError::PartialResult { .. } | ScrapeError::UnhandledMultiplier(_) => {
            ErrorCategory::Temporary
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_status_precedence() {
        assert_eq!(classify("", Some(429)), ErrorCategory::RateLimit);
        assert_eq!(classify("", Some(404)), ErrorCategory::NotFound);
        assert_eq!(classify("", Some(500)), ErrorCategory::Temporary);
        assert_eq!(classify("", Some(503)), ErrorCategory::Temporary);
        // Status beats a misleading message
        assert_eq!(classify("captcha", Some(429)), ErrorCategory::RateLimit);
    }

    #[test]
    fn test_message_checks_in_order() {
        assert_eq!(classify("Found CAPTCHA", None), ErrorCategory::Captcha);
        assert_eq!(classify("consent wall", None), ErrorCategory::Consent);
        assert_eq!(classify("Navigation timeout of 30000 ms", None), ErrorCategory::Timeout);
        assert_eq!(classify("operation timed out", None), ErrorCategory::Timeout);
        assert_eq!(classify("net::ERR_CONNECTION_RESET", None), ErrorCategory::Network);
        assert_eq!(classify("Network unreachable", None), ErrorCategory::Network);
        assert_eq!(classify("Too Many Requests", None), ErrorCategory::RateLimit);
        assert_eq!(classify("hit rate limit", None), ErrorCategory::RateLimit);
        assert_eq!(classify("something odd", None), ErrorCategory::Temporary);
        // Captcha wins over timeout when both appear
        assert_eq!(classify("captcha timeout", None), ErrorCategory::Captcha);
    }

    #[test]
    fn test_non_error_status_falls_through_to_message() {
        assert_eq!(classify("connection refused", Some(200)), ErrorCategory::Network);
        assert_eq!(classify("weird", Some(403)), ErrorCategory::Temporary);
    }

    #[test]
    fn test_classify_typed_errors() {
        let captcha = ScrapeError::CaptchaDetected {
            url: "https://www.youtube.com/@x/about".into(),
        };
        assert_eq!(classify_error(&captcha), ErrorCategory::Captcha);
        assert_eq!(classify_error(&ScrapeError::Timeout(30)), ErrorCategory::Timeout);
        let consent = ScrapeError::ConsentBlocked { url: "https://consent.youtube.com".into() };
        assert_eq!(classify_error(&consent), ErrorCategory::Consent);
        let not_found = ScrapeError::HttpStatus { status: 404, url: String::new() };
        assert_eq!(classify_error(&not_found), ErrorCategory::NotFound);
    }

    #[test]
    fn test_channel_url_words_do_not_pick_category() {
        let forbidden = ScrapeError::HttpStatus {
            status: 403,
            url: "https://www.youtube.com/@captchasolver/about".into(),
        };
        assert_eq!(classify_error(&forbidden), ErrorCategory::Temporary);

        let partial = ScrapeError::PartialResult {
            url: "https://www.youtube.com/@consentwall".into(),
        };
        assert_eq!(classify_error(&partial), ErrorCategory::Temporary);

        let partial = ScrapeError::PartialResult {
            url: "https://www.youtube.com/@networkchuck".into(),
        };
        assert_eq!(classify_error(&partial), ErrorCategory::Temporary);
    }

    #[test]
    fn test_free_text_details_use_message_checks() {
        let reset = ScrapeError::Network("connection reset by peer".into());
        assert_eq!(classify_error(&reset), ErrorCategory::Network);
        let bare = ScrapeError::Network("dns lookup failed".into());
        assert_eq!(classify_error(&bare), ErrorCategory::Network);
        let slow = ScrapeError::Network("request timeout: deadline elapsed".into());
        assert_eq!(classify_error(&slow), ErrorCategory::Timeout);
        let crashed = ScrapeError::Browser("target crashed".into());
        assert_eq!(classify_error(&crashed), ErrorCategory::Temporary);
        let nav = ScrapeError::Browser("Navigation timeout of 30000 ms exceeded".into());
        assert_eq!(classify_error(&nav), ErrorCategory::Timeout);
    }

    #[test]
    fn test_category_strings_unique() {
        let mut seen = std::collections::HashSet::new();
        for category in ErrorCategory::iter() {
            assert!(seen.insert(category.as_str()));
            assert_eq!(category.to_string(), category.as_str());
        }
    }
}
