//! Raw-markup fallback for social links.
//!
//! Last resort when neither the structured object nor the DOM produced any
//! outbound links: scan the full markup for URLs on known social domains.

use regex::Regex;
use std::sync::LazyLock;
use strum::IntoEnumIterator;

use crate::parse::Platform;
use crate::utils::compile_regex_unsafe;

static SOCIAL_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    let domains: Vec<String> = Platform::iter()
        .filter(|p| !matches!(p, Platform::Youtube | Platform::Website))
        .flat_map(|p| p.domains().iter().map(|d| regex::escape(d)))
        .collect();
    let pattern = format!(
        r#"https?://(?:[A-Za-z0-9-]+\.)*(?:{})/[^\s"'<>\\)]+"#,
        domains.join("|")
    );
    compile_regex_unsafe(&pattern, "SOCIAL_URL_RE")
});

/// Finds social-platform URLs in raw page markup.
///
/// JSON-escaped slashes and ampersands inside inline scripts are unescaped
/// first. Results are deduplicated in first-seen order.
pub fn social_links_from_markup(markup: &str) -> Vec<String> {
    let unescaped = markup
        .replace("\\/", "/")
        .replace("\\u0026", "&")
        .replace("&amp;", "&");
    let mut links: Vec<String> = Vec::new();
    for m in SOCIAL_URL_RE.find_iter(&unescaped) {
        let link = m.as_str().trim_end_matches(['.', ',', ';']).to_string();
        if !links.contains(&link) {
            links.push(link);
        }
    }
    links
}
