//! Integration tests for the HTTP page loader and keyword search
//!
//! Both talk to a local mock server serving pages with an inline bootstrap
//! object, the way the real site embeds it.

use channel_scout::browser::{Browser, HttpBrowser, Session};
use channel_scout::extract::{ChannelExtractor, ExtractionSource, ExtractorSettings};
use channel_scout::input::{
    collect_keyword_results, ChannelIdentifier, ChannelSearch, InputSource, YoutubeSearch,
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn page_with_bootstrap(data: &serde_json::Value) -> String {
    format!(
        "<html><head><script>var ytInitialData = {};</script></head><body></body></html>",
        data
    )
}

fn direct_session() -> Session {
    Session { id: 0, proxy: None }
}

#[tokio::test]
async fn test_http_page_feeds_extractor() {
    let server = MockServer::start().await;
    let data = json!({
        "metadata": {"channelMetadataRenderer": {"title": "Maker"}},
        "header": {"c4TabbedHeaderRenderer": {
            "subscriberCountText": {"simpleText": "10.5M subscribers"}
        }}
    });
    Mock::given(method("GET"))
        .and(path("/@maker/about"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(page_with_bootstrap(&data)),
        )
        .mount(&server)
        .await;

    let browser = HttpBrowser::with_client(reqwest::Client::new());
    let page = browser.open_page(&direct_session()).await.unwrap();
    let response = page
        .navigate(&format!("{}/@maker/about", server.uri()))
        .await
        .unwrap();
    assert_eq!(response.status, Some(200));

    let extractor = ChannelExtractor::new(ExtractorSettings {
        dom_timeout: Duration::from_millis(10),
        ..ExtractorSettings::default()
    });
    let identifier = ChannelIdentifier::new(
        "https://www.youtube.com/@maker".into(),
        InputSource::DirectInput,
        None,
    );
    let record = extractor.extract(page.as_ref(), &identifier).await.unwrap();
    page.close().await;

    assert_eq!(record.name, "Maker");
    assert_eq!(record.subscriber_count, 10_500_000);
    assert_eq!(record.extraction_source, ExtractionSource::StructuredData);
}

#[tokio::test]
async fn test_http_page_reports_not_found_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/@gone/about"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let browser = HttpBrowser::with_client(reqwest::Client::new());
    let page = browser.open_page(&direct_session()).await.unwrap();
    let response = page
        .navigate(&format!("{}/@gone/about", server.uri()))
        .await
        .unwrap();
    assert_eq!(response.status, Some(404));
}

#[tokio::test]
async fn test_search_reads_channel_renderers() {
    let server = MockServer::start().await;
    let data = json!({"contents": {"twoColumnSearchResultsRenderer": {"primaryContents": {
        "sectionListRenderer": {"contents": [{"itemSectionRenderer": {"contents": [
            {"channelRenderer": {"navigationEndpoint": {"browseEndpoint": {"canonicalBaseUrl": "/@first"}}}},
            {"videoRenderer": {}},
            {"channelRenderer": {"navigationEndpoint": {"browseEndpoint": {"canonicalBaseUrl": "/@second"}}}},
            {"channelRenderer": {"navigationEndpoint": {"browseEndpoint": {"canonicalBaseUrl": "/@first"}}}}
        ]}}]}
    }}}});
    Mock::given(method("GET"))
        .and(path("/results"))
        .and(query_param("search_query", "wood working"))
        .and(query_param("sp", "EgIQAg=="))
        .respond_with(ResponseTemplate::new(200).set_body_string(page_with_bootstrap(&data)))
        .mount(&server)
        .await;

    let search = YoutubeSearch::with_base_url(reqwest::Client::new(), &server.uri());
    let urls = search.search("wood working", 10).await.unwrap();
    assert_eq!(
        urls,
        vec![
            "https://www.youtube.com/@first",
            "https://www.youtube.com/@second"
        ]
    );
}

#[tokio::test]
async fn test_failed_keyword_does_not_stop_others() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/results"))
        .and(query_param("search_query", "broken"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/results"))
        .and(query_param("search_query", "fine"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<script>{"canonicalBaseUrl":"/@fine"}</script>"#),
        )
        .mount(&server)
        .await;

    let search = YoutubeSearch::with_base_url(reqwest::Client::new(), &server.uri());
    let keywords = vec!["broken".to_string(), "  ".to_string(), "fine".to_string()];
    let hits = collect_keyword_results(&search, &keywords, 5).await;

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].keyword, "fine");
    assert_eq!(hits[0].url, "https://www.youtube.com/@fine");
}
