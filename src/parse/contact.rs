//! Contact information extraction from free text (channel descriptions).

use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::utils::compile_regex_unsafe;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(
        r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}",
        "EMAIL_RE",
    )
});

/// Loose phone shape; candidates are filtered on digit count afterwards.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(r"\+?\(?\d[\d\s().-]{7,}\d", "PHONE_RE"));

const MIN_PHONE_DIGITS: usize = 9;
const MAX_PHONE_DIGITS: usize = 15;

/// Emails and phone numbers found in a block of text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactInfo {
    pub emails: Vec<String>,
    pub phones: Vec<String>,
}

/// Extracts contact emails and phone numbers from text.
///
/// Emails are lowercased. Both lists are deduplicated and keep first-seen order.
/// Absent or empty text yields empty lists; this function never fails.
pub fn extract_contact_info(text: Option<&str>) -> ContactInfo {
    let text = match text {
        Some(t) if !t.trim().is_empty() => t,
        _ => return ContactInfo::default(),
    };

    let mut seen = HashSet::new();
    let emails: Vec<String> = EMAIL_RE
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches('.').to_lowercase())
        .filter(|e| seen.insert(e.clone()))
        .collect();

    let mut seen = HashSet::new();
    let phones: Vec<String> = PHONE_RE
        .find_iter(text)
        .map(|m| m.as_str().trim().to_string())
        .filter(|p| {
            let digits = p.chars().filter(|c| c.is_ascii_digit()).count();
            (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits)
        })
        .filter(|p| {
            // Dedup on digits so "+1 555 123 4567" and "+1-555-123-4567" collapse
            let key: String = p.chars().filter(|c| c.is_ascii_digit()).collect();
            seen.insert(key)
        })
        .collect();

    ContactInfo { emails, phones }
}
