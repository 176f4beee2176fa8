//! Keyword search for channel URLs.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use regex::Regex;
use serde_json::Value;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;
use url::Url;

use super::canonical::CANONICAL_ORIGIN;
use super::normalize::SearchHit;
use crate::error_handling::ScrapeError;
use crate::extract::{extract_bootstrap_object, probe_all, Seg, INITIAL_DATA_VAR};
use crate::utils::compile_regex_unsafe;

/// `sp` filter value restricting results to channels.
const CHANNEL_FILTER: &str = "EgIQAg==";

/// Attempts per keyword before the keyword is skipped.
const SEARCH_ATTEMPTS: usize = 3;

/// Search retry delays: 500ms, 1s, ... capped at 5s.
const SEARCH_RETRY_BASE_MS: u64 = 2;
const SEARCH_RETRY_FACTOR: u64 = 250;
const SEARCH_RETRY_MAX_DELAY: Duration = Duration::from_secs(5);

const CHANNEL_RENDERER_PATH: &[Seg] = &[
    Seg::Key("contents"),
    Seg::Key("twoColumnSearchResultsRenderer"),
    Seg::Key("primaryContents"),
    Seg::Key("sectionListRenderer"),
    Seg::Key("contents"),
    Seg::Each,
    Seg::Key("itemSectionRenderer"),
    Seg::Key("contents"),
    Seg::Each,
    Seg::Key("channelRenderer"),
    Seg::Key("navigationEndpoint"),
    Seg::Key("browseEndpoint"),
    Seg::Key("canonicalBaseUrl"),
];

/// Fallback when the bootstrap object cannot be located or walked.
static CANONICAL_BASE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex_unsafe(
        r#""canonicalBaseUrl":"(/(?:@|channel/|c/|user/)[^"]+)""#,
        "CANONICAL_BASE_URL_RE",
    )
});

/// Source of channel URLs for a keyword.
#[async_trait]
pub trait ChannelSearch: Send + Sync {
    /// Returns up to `limit` absolute channel URLs for `keyword`, best first.
    async fn search(&self, keyword: &str, limit: usize) -> Result<Vec<String>, ScrapeError>;
}

/// Searches the public results page filtered to channels.
pub struct YoutubeSearch {
    client: reqwest::Client,
    base_url: String,
}

impl YoutubeSearch {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, CANONICAL_ORIGIN)
    }

    /// Uses a different origin (e.g. a local mirror).
    pub fn with_base_url(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn results_url(&self, keyword: &str) -> Result<Url, ScrapeError> {
        Url::parse_with_params(
            &format!("{}/results", self.base_url),
            &[("search_query", keyword), ("sp", CHANNEL_FILTER)],
        )
        .map_err(|e| ScrapeError::Network(format!("invalid search URL: {e}")))
    }

    async fn fetch_results_page(&self, url: &Url) -> Result<String, ScrapeError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl ChannelSearch for YoutubeSearch {
    async fn search(&self, keyword: &str, limit: usize) -> Result<Vec<String>, ScrapeError> {
        let url = self.results_url(keyword)?;
        let strategy = ExponentialBackoff::from_millis(SEARCH_RETRY_BASE_MS)
            .factor(SEARCH_RETRY_FACTOR)
            .max_delay(SEARCH_RETRY_MAX_DELAY)
            .map(jitter)
            .take(SEARCH_ATTEMPTS - 1);

        let url = &url;
        let html = Retry::spawn(strategy, move || async move {
            self.fetch_results_page(url).await.inspect_err(|e| {
                debug!("Search request for {:?} failed: {}", keyword, e);
            })
        })
        .await?;

        let urls = parse_search_results(&html, limit);
        if let Some(missing) = results_shortfall(urls.len(), limit) {
            // Continuation pages are not followed
            warn!(
                "Search for {:?} found {} of {} requested channels ({} short); only the first results page is read",
                keyword,
                urls.len(),
                limit,
                missing
            );
        }
        Ok(urls)
    }
}

/// Number of requested results a search came up short by, if any.
fn results_shortfall(found: usize, requested: usize) -> Option<usize> {
    requested.checked_sub(found).filter(|missing| *missing > 0)
}

/// Extracts channel URLs from a search results page.
///
/// Walks the bootstrap object first and falls back to a regex over the markup.
/// Results are absolute, deduplicated in page order and truncated to `limit`.
pub fn parse_search_results(html: &str, limit: usize) -> Vec<String> {
    let mut paths: Vec<String> = extract_bootstrap_object(html, INITIAL_DATA_VAR)
        .map(|data| {
            probe_all(&data, CHANNEL_RENDERER_PATH)
                .into_iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    if paths.is_empty() {
        paths = CANONICAL_BASE_URL_RE
            .captures_iter(html)
            .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
            .collect();
    }

    let mut urls: Vec<String> = Vec::new();
    for path in paths {
        let url = format!("{CANONICAL_ORIGIN}{path}");
        if !urls.contains(&url) {
            urls.push(url);
        }
    }
    urls.truncate(limit);
    urls
}

/// Runs every keyword search and tags results with their keyword.
///
/// A keyword whose search fails is logged and skipped; the run continues with
/// whatever the other keywords returned.
pub async fn collect_keyword_results(
    search: &dyn ChannelSearch,
    keywords: &[String],
    results_per_keyword: usize,
) -> Vec<SearchHit> {
    let mut hits = Vec::new();
    for keyword in keywords.iter().map(|k| k.trim()).filter(|k| !k.is_empty()) {
        match search.search(keyword, results_per_keyword).await {
            Ok(urls) => {
                info!("Keyword {:?} returned {} channels", keyword, urls.len());
                hits.extend(urls.into_iter().map(|url| SearchHit {
                    keyword: keyword.to_string(),
                    url,
                }));
            }
            Err(e) => warn!("Search for keyword {:?} failed, skipping: {}", keyword, e),
        }
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct StubSearch(HashMap<&'static str, Vec<&'static str>>);

    #[async_trait]
    impl ChannelSearch for StubSearch {
        async fn search(&self, keyword: &str, limit: usize) -> Result<Vec<String>, ScrapeError> {
            match self.0.get(keyword) {
                Some(urls) => Ok(urls.iter().take(limit).map(|u| u.to_string()).collect()),
                None => Err(ScrapeError::HttpStatus {
                    status: 503,
                    url: "https://www.youtube.com/results".into(),
                }),
            }
        }
    }

    #[test]
    fn test_parse_from_bootstrap_object() {
        let html = r#"<script>var ytInitialData = {"contents":{"twoColumnSearchResultsRenderer":
            {"primaryContents":{"sectionListRenderer":{"contents":[{"itemSectionRenderer":{"contents":[
              {"channelRenderer":{"navigationEndpoint":{"browseEndpoint":{"canonicalBaseUrl":"/@alpha"}}}},
              {"videoRenderer":{}},
              {"channelRenderer":{"navigationEndpoint":{"browseEndpoint":{"canonicalBaseUrl":"/@beta"}}}},
              {"channelRenderer":{"navigationEndpoint":{"browseEndpoint":{"canonicalBaseUrl":"/@alpha"}}}}
            ]}}]}}}}};</script>"#;
        assert_eq!(
            parse_search_results(html, 10),
            vec!["https://www.youtube.com/@alpha", "https://www.youtube.com/@beta"]
        );
        assert_eq!(parse_search_results(html, 1), vec!["https://www.youtube.com/@alpha"]);
    }

    #[test]
    fn test_parse_regex_fallback() {
        let html = r#"junk "canonicalBaseUrl":"/@gamma" more "canonicalBaseUrl":"/channel/UC123""#;
        assert_eq!(
            parse_search_results(html, 10),
            vec![
                "https://www.youtube.com/@gamma",
                "https://www.youtube.com/channel/UC123"
            ]
        );
    }

    #[test]
    fn test_results_shortfall() {
        assert_eq!(results_shortfall(2, 10), Some(8));
        assert_eq!(results_shortfall(0, 5), Some(5));
        assert_eq!(results_shortfall(10, 10), None);
        assert_eq!(results_shortfall(3, 0), None);
    }

    #[test]
    fn test_parse_empty_page() {
        assert!(parse_search_results("<html></html>", 10).is_empty());
    }

    #[test]
    fn test_results_url_encodes_keyword() {
        let search = YoutubeSearch::new(reqwest::Client::new());
        let url = search.results_url("rust & go").unwrap();
        assert_eq!(url.path(), "/results");
        let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["search_query"], "rust & go");
        assert_eq!(pairs["sp"], CHANNEL_FILTER);
    }

    #[tokio::test]
    async fn test_collect_skips_failed_keywords() {
        let search = StubSearch(HashMap::from([
            ("cooking", vec!["https://www.youtube.com/@chef", "https://www.youtube.com/@baker"]),
            ("woodwork", vec!["https://www.youtube.com/@joiner"]),
        ]));
        let keywords = vec![
            "cooking".to_string(),
            "broken".to_string(),
            " ".to_string(),
            "woodwork".to_string(),
        ];
        let hits = collect_keyword_results(&search, &keywords, 1).await;
        assert_eq!(
            hits,
            vec![
                SearchHit {
                    keyword: "cooking".into(),
                    url: "https://www.youtube.com/@chef".into()
                },
                SearchHit {
                    keyword: "woodwork".into(),
                    url: "https://www.youtube.com/@joiner".into()
                },
            ]
        );
    }
}
