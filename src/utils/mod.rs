//! Small shared helpers for static patterns and selectors.

use regex::Regex;
use scraper::Selector;

/// Compiles a regex pattern that must succeed (for compile-time constants).
///
/// # Panics
///
/// Panics if the pattern cannot be compiled (indicates a programming error).
pub(crate) fn compile_regex_unsafe(pattern: &str, context: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| {
        panic!(
            "Failed to compile regex pattern '{}' in {}: {}. This is a programming error.",
            pattern, context, e
        )
    })
}

/// Parses a CSS selector supplied at runtime.
///
/// Unlike the static selectors, these come from probe tables and page adapters,
/// so an unparseable selector is logged and treated as matching nothing.
///
/// # Returns
///
/// The parsed selector, or `None` if it is not valid CSS for `scraper`.
pub(crate) fn parse_selector_lenient(selector_str: &str) -> Option<Selector> {
    match Selector::parse(selector_str) {
        Ok(selector) => Some(selector),
        Err(e) => {
            log::debug!("Unsupported CSS selector '{}': {}", selector_str, e);
            None
        }
    }
}
