//! Channel URL validation and canonicalization.

use log::warn;
use serde::Serialize;
use url::Url;

/// Host every canonical channel URL uses.
pub const CANONICAL_ORIGIN: &str = "https://www.youtube.com";

/// Maximum accepted input length, matching common browser/server URL limits.
const MAX_URL_LENGTH: usize = 2048;

const ACCEPTED_HOSTS: &[&str] = &["youtube.com", "www.youtube.com", "m.youtube.com"];

/// Where an identifier came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
    /// Listed directly by the operator
    DirectInput,
    /// Read from a bulk import file
    BulkImport,
    /// Returned by a keyword search
    Search,
}

impl InputSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputSource::DirectInput => "direct_input",
            InputSource::BulkImport => "bulk_import",
            InputSource::Search => "search",
        }
    }
}

/// A canonical channel URL plus its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelIdentifier {
    /// Canonical channel URL (see [`canonicalize_channel_url`])
    pub url: String,
    /// Input source that produced it
    pub source: InputSource,
    /// Search keyword or bulk row number, when applicable
    pub origin: Option<String>,
}

impl ChannelIdentifier {
    pub fn new(url: String, source: InputSource, origin: Option<String>) -> Self {
        Self { url, source, origin }
    }

    /// URL of the channel's about surface.
    pub fn about_url(&self) -> String {
        format!("{}/about", self.url)
    }
}

fn is_name_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '%'))
}

/// Validates a raw channel reference and returns its canonical URL.
///
/// Accepts `@handle` shorthand and YouTube URLs (with or without scheme) whose
/// path starts with `@handle`, `/channel/<id>`, `/c/<name>` or `/user/<name>`.
/// Trailing tabs (`/about`, `/videos`), query strings and fragments are dropped.
/// The result always uses `https://www.youtube.com` and has no trailing slash,
/// so canonicalizing a canonical URL returns it unchanged.
///
/// # Arguments
///
/// * `raw` - Raw user or search-provided reference
///
/// # Returns
///
/// `Some(canonical_url)` for a recognized channel reference, `None` otherwise
/// (a warning is logged).
pub fn canonicalize_channel_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.len() > MAX_URL_LENGTH {
        warn!(
            "Skipping channel reference exceeding maximum length ({} > {}): {}...",
            trimmed.len(),
            MAX_URL_LENGTH,
            trimmed.chars().take(50).collect::<String>()
        );
        return None;
    }

    let candidate = if trimmed.starts_with('@') {
        format!("{CANONICAL_ORIGIN}/{trimmed}")
    } else if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let parsed = match Url::parse(&candidate) {
        Ok(u) => u,
        Err(_) => {
            warn!("Skipping invalid channel reference: {raw}");
            return None;
        }
    };

    let host = parsed.host_str().unwrap_or_default().to_lowercase();
    if !ACCEPTED_HOSTS.contains(&host.as_str()) {
        warn!("Skipping non-YouTube reference: {raw}");
        return None;
    }

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    let path = match segments.as_slice() {
        [first, ..] if first.starts_with('@') && is_name_segment(&first[1..]) => first.to_string(),
        [kind, name, ..]
            if matches!(*kind, "channel" | "c" | "user") && is_name_segment(name) =>
        {
            format!("{kind}/{name}")
        }
        _ => {
            warn!("Skipping unrecognized channel URL shape: {raw}");
            return None;
        }
    };

    Some(format!("{CANONICAL_ORIGIN}/{path}"))
}
