//! Compact count decoding ("1.2M subscribers", "850K views", "12,345 videos").

use regex::Regex;
use std::sync::LazyLock;

use crate::error_handling::UnhandledMultiplierError;
use crate::utils::compile_regex_unsafe;

/// A letter directly after a digit (optionally separated by whitespace) that is
/// not the start of a longer word. "1.2M subscribers" matches `M`; "10 subscribers"
/// does not match `s`.
static MULTIPLIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(r"\d\s?([A-Za-z])(?:[^A-Za-z]|$)", "MULTIPLIER_RE")
});

/// Decodes a human-readable count into an integer.
///
/// Only digits, commas and periods are kept for the numeric part. Commas are
/// thousands separators. A multiplier letter (K, M, B, T, Q; case-insensitive)
/// scales the value by 10^3, 10^6, 10^9, 10^12 or 10^15 and the result is rounded.
///
/// # Arguments
///
/// * `text` - Count text as rendered on the page
///
/// # Returns
///
/// The decoded count. Text with no digits (e.g. "", "—", "No subscribers") is 0.
///
/// # Errors
///
/// Returns `UnhandledMultiplierError` if the multiplier letter is not recognized.
pub fn parse_compact_count(text: &str) -> Result<u64, UnhandledMultiplierError> {
    let numeric: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    if !numeric.chars().any(|c| c.is_ascii_digit()) {
        return Ok(0);
    }

    let value: f64 = match numeric.replace(',', "").parse() {
        Ok(v) => v,
        Err(_) => {
            log::debug!("Could not parse numeric part of count {:?}", text);
            return Ok(0);
        }
    };

    let multiplier = match MULTIPLIER_RE.captures(text).and_then(|c| c.get(1)) {
        None => 1.0,
        Some(m) => match m.as_str().to_ascii_uppercase().as_str() {
            "K" => 1e3,
            "M" => 1e6,
            "B" => 1e9,
            "T" => 1e12,
            "Q" => 1e15,
            _ => {
                return Err(UnhandledMultiplierError {
                    multiplier: m.as_str().chars().next().unwrap_or('?'),
                    text: text.to_string(),
                })
            }
        },
    };

    Ok((value * multiplier).round() as u64)
}
