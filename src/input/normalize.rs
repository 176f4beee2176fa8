//! Merging input sources into one ordered, deduplicated identifier list.

use std::collections::HashSet;

use log::{info, warn};

use super::canonical::{canonicalize_channel_url, ChannelIdentifier, InputSource};
use crate::error_handling::ConfigError;

/// One row read from a bulk import file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkRecord {
    /// Raw channel reference as found in the file
    pub url: String,
    /// 1-based row (or line) number, for provenance and warnings
    pub row: usize,
}

/// One channel URL returned by a keyword search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub keyword: String,
    pub url: String,
}

/// The raw input sources. Any of them may be empty.
#[derive(Debug, Clone, Default)]
pub struct InputSources {
    pub direct_urls: Vec<String>,
    pub bulk_records: Vec<BulkRecord>,
    pub keyword_results: Vec<SearchHit>,
}

impl InputSources {
    pub fn is_empty(&self) -> bool {
        self.direct_urls.is_empty() && self.bulk_records.is_empty() && self.keyword_results.is_empty()
    }
}

/// Normalizes all input sources into an ordered set of channel identifiers.
///
/// Sources are merged in order direct, bulk, search. Invalid references are
/// dropped with a warning, duplicates keep their first occurrence, and the list
/// is truncated to `max_identifiers` with a warning.
///
/// # Arguments
///
/// * `sources` - Raw direct URLs, bulk rows and search hits
/// * `max_identifiers` - Upper bound on the number of identifiers returned
///
/// # Errors
///
/// Returns `ConfigError::NoInput` if all three sources are empty.
pub fn normalize(
    sources: &InputSources,
    max_identifiers: usize,
) -> Result<Vec<ChannelIdentifier>, ConfigError> {
    if sources.is_empty() {
        return Err(ConfigError::NoInput);
    }

    let direct = sources
        .direct_urls
        .iter()
        .map(|u| (u.as_str(), InputSource::DirectInput, None::<String>));
    let bulk = sources
        .bulk_records
        .iter()
        .map(|r| (r.url.as_str(), InputSource::BulkImport, Some(format!("row {}", r.row))));
    let search = sources
        .keyword_results
        .iter()
        .map(|h| (h.url.as_str(), InputSource::Search, Some(h.keyword.clone())));

    let mut seen = HashSet::new();
    let mut identifiers = Vec::new();
    let mut invalid = 0usize;
    let mut duplicates = 0usize;
    for (raw, source, origin) in direct.chain(bulk).chain(search) {
        let Some(url) = canonicalize_channel_url(raw) else {
            invalid += 1;
            continue;
        };
        if seen.insert(url.clone()) {
            identifiers.push(ChannelIdentifier::new(url, source, origin));
        } else {
            duplicates += 1;
        }
    }

    if identifiers.len() > max_identifiers {
        warn!(
            "Input contains {} channels; only the first {} will be processed",
            identifiers.len(),
            max_identifiers
        );
        identifiers.truncate(max_identifiers);
    }

    info!(
        "Normalized input: {} channel(s) ({} invalid, {} duplicate)",
        identifiers.len(),
        invalid,
        duplicates
    );
    Ok(identifiers)
}

/// Skips identifiers preceding the resume marker.
///
/// The marker is canonicalized first. If it does not match any identifier, a
/// warning is logged and the list is returned unchanged.
pub fn apply_resume_marker(
    identifiers: Vec<ChannelIdentifier>,
    marker: Option<&str>,
) -> Vec<ChannelIdentifier> {
    let Some(marker) = marker.filter(|m| !m.trim().is_empty()) else {
        return identifiers;
    };
    let Some(canonical) = canonicalize_channel_url(marker) else {
        warn!("Resume marker {marker:?} is not a channel reference; processing everything");
        return identifiers;
    };
    match identifiers.iter().position(|id| id.url == canonical) {
        Some(pos) => {
            info!("Resuming from {canonical}: skipping {pos} channel(s)");
            identifiers.into_iter().skip(pos).collect()
        }
        None => {
            warn!("Resume marker {canonical} not found in input; processing everything");
            identifiers
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct(urls: &[&str]) -> InputSources {
        InputSources {
            direct_urls: urls.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_all_sources_empty_is_config_error() {
        assert_eq!(normalize(&InputSources::default(), 1000), Err(ConfigError::NoInput));
    }

    #[test]
    fn test_dedup_first_seen_wins() {
        let ids = normalize(&direct(&["@a", "https://www.youtube.com/@a", "@b"]), 1000).unwrap();
        let urls: Vec<_> = ids.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(urls, vec!["https://www.youtube.com/@a", "https://www.youtube.com/@b"]);
    }

    #[test]
    fn test_source_order_and_provenance() {
        let sources = InputSources {
            direct_urls: vec!["@direct".into()],
            bulk_records: vec![
                BulkRecord { url: "@bulk".into(), row: 2 },
                BulkRecord { url: "@direct".into(), row: 3 },
            ],
            keyword_results: vec![SearchHit {
                keyword: "cooking".into(),
                url: "https://www.youtube.com/@found".into(),
            }],
        };
        let ids = normalize(&sources, 1000).unwrap();
        assert_eq!(ids.len(), 3);
        assert_eq!(ids[2].source, InputSource::Search);
        assert_eq!(ids[0].source, InputSource::DirectInput);
        assert_eq!(ids[1].source, InputSource::BulkImport);
        assert_eq!(ids[1].origin.as_deref(), Some("row 2"));
    }

    #[test]
    fn test_search_hits_accept_full_urls() {
        let sources = InputSources {
            keyword_results: vec![SearchHit {
                keyword: "cooking".into(),
                url: "https://www.youtube.com/@chef".into(),
            }],
            ..Default::default()
        };
        let ids = normalize(&sources, 1000).unwrap();
        assert_eq!(ids[0].origin.as_deref(), Some("cooking"));
        assert_eq!(ids[0].source, InputSource::Search);
    }

    #[test]
    fn test_cap_truncates() {
        let ids = normalize(&direct(&["@a", "@b", "@c"]), 2).unwrap();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn test_invalid_entries_dropped() {
        let ids = normalize(&direct(&["https://example.com", "@ok"]), 10).unwrap();
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn test_resume_marker() {
        let ids = normalize(&direct(&["@a", "@b", "@c"]), 10).unwrap();
        let resumed = apply_resume_marker(ids.clone(), Some("youtube.com/@b/about"));
        assert_eq!(resumed.len(), 2);
        assert_eq!(resumed[0].url, "https://www.youtube.com/@b");

        let unknown = apply_resume_marker(ids.clone(), Some("@zzz"));
        assert_eq!(unknown.len(), 3);
        assert_eq!(apply_resume_marker(ids, None).len(), 3);
    }
}
