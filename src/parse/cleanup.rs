//! URL cleanup helpers.

use url::Url;

/// Strips the query string and fragment from a URL.
///
/// Parses the URL when possible; otherwise falls back to cutting the string at the
/// first `?` or `#`. Never fails, and returns the input unchanged when there is
/// nothing to strip.
pub fn clean_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.contains(['?', '#']) {
        return trimmed.to_string();
    }
    match Url::parse(trimmed) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => trimmed
            .split(['?', '#'])
            .next()
            .unwrap_or(trimmed)
            .to_string(),
    }
}
