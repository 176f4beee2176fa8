// Shared test helpers: scripted pages and browsers for crawl tests.
//
// A `FakeBrowser` maps about-page URLs to scenarios; every page it opens
// behaves according to the scenario of the URL it is navigated to.

#![allow(dead_code)] // Not every test file uses every helper

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use channel_scout::adaptive_rate_limiter::RateSettings;
use channel_scout::browser::{Browser, Session, SessionPool};
use channel_scout::error_handling::ScrapeError;
use channel_scout::extract::{
    ChannelPage, ElementSnapshot, ExtractorSettings, FrameInfo, NavigationResponse,
    INITIAL_DATA_SCRIPT,
};
use channel_scout::input::{ChannelIdentifier, InputSource};
use channel_scout::storage::{MemoryFailureSink, MemorySink};
use channel_scout::{CrawlDeps, CrawlSettings};

/// How a page behaves once navigated to a URL.
#[derive(Debug, Clone)]
pub enum Scenario {
    /// Status 200 with this bootstrap object
    Channel(Value),
    /// Status 200 with a CAPTCHA challenge
    Captcha,
    /// Navigation returns this HTTP status
    Status(u16),
    /// Navigation never completes
    Stall,
    /// Navigation lands on the consent interstitial, which cannot be accepted
    Consent,
    /// Navigation succeeds but the page never answers script evaluation
    Unresponsive,
    /// Status 200 with this bootstrap object; element lookups that miss
    /// wait out their whole timeout
    SlowMisses(Value),
    /// The first `failures` navigations fail at the transport level, then `then`
    Flaky { failures: usize, then: Box<Scenario> },
}

/// Bootstrap object for a channel with a name, subscriber text and a badge.
pub fn channel_data(name: &str, subscribers: &str) -> Value {
    json!({
        "metadata": {"channelMetadataRenderer": {
            "title": name,
            "description": format!("{name} makes things. Contact: hello@{}.example", name.to_lowercase())
        }},
        "header": {"c4TabbedHeaderRenderer": {
            "subscriberCountText": {"simpleText": subscribers},
            "videosCountText": {"runs": [{"text": "312"}, {"text": " videos"}]},
            "badges": [{"metadataBadgeRenderer": {"tooltip": "Verified"}}]
        }}
    })
}

pub fn about_url(channel_url: &str) -> String {
    format!("{channel_url}/about")
}

pub fn identifier(url: &str) -> ChannelIdentifier {
    ChannelIdentifier::new(url.to_string(), InputSource::DirectInput, None)
}

/// Browser whose pages follow per-URL scenarios and which counts what happens.
#[derive(Default)]
pub struct FakeBrowser {
    scenarios: HashMap<String, Scenario>,
    pub navigations: Arc<Mutex<HashMap<String, usize>>>,
    pub opened: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the scenario for a channel (keyed by its about URL).
    pub fn with_channel(mut self, channel_url: &str, scenario: Scenario) -> Self {
        self.scenarios.insert(about_url(channel_url), scenario);
        self
    }

    pub fn navigations_to(&self, channel_url: &str) -> usize {
        self.navigations
            .lock()
            .unwrap()
            .get(&about_url(channel_url))
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn open_page(&self, _session: &Session) -> Result<Box<dyn ChannelPage>, ScrapeError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakePage {
            scenarios: self.scenarios.clone(),
            navigations: Arc::clone(&self.navigations),
            closed: Arc::clone(&self.closed),
            url: Mutex::new("about:blank".to_string()),
            active: Mutex::new(None),
        }))
    }
}

pub struct FakePage {
    scenarios: HashMap<String, Scenario>,
    navigations: Arc<Mutex<HashMap<String, usize>>>,
    closed: Arc<AtomicUsize>,
    url: Mutex<String>,
    active: Mutex<Option<Scenario>>,
}

impl FakePage {
    fn active(&self) -> Option<Scenario> {
        self.active.lock().unwrap().clone()
    }

    fn is_captcha(&self) -> bool {
        matches!(self.active(), Some(Scenario::Captcha))
    }

    async fn miss(&self, timeout: Duration) -> Result<Option<ElementSnapshot>, ScrapeError> {
        if matches!(self.active(), Some(Scenario::SlowMisses(_))) {
            tokio::time::sleep(timeout).await;
        }
        Ok(None)
    }
}

#[async_trait]
impl ChannelPage for FakePage {
    async fn navigate(&self, url: &str) -> Result<NavigationResponse, ScrapeError> {
        let visit = {
            let mut navigations = self.navigations.lock().unwrap();
            let count = navigations.entry(url.to_string()).or_insert(0);
            *count += 1;
            *count
        };
        let landed = match self.scenarios.get(url) {
            Some(Scenario::Consent) => format!("https://consent.youtube.com/m?continue={url}"),
            _ => url.to_string(),
        };
        *self.url.lock().unwrap() = landed;

        let scenario = match self.scenarios.get(url).cloned() {
            Some(Scenario::Flaky { failures, then }) => {
                if visit <= failures {
                    return Err(ScrapeError::Network("connection reset by peer".into()));
                }
                *then
            }
            Some(scenario) => scenario,
            None => Scenario::Status(404),
        };

        let status = match &scenario {
            Scenario::Status(status) => *status,
            Scenario::Stall => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                200
            }
            _ => 200,
        };
        *self.active.lock().unwrap() = Some(scenario);
        Ok(NavigationResponse {
            status: Some(status),
        })
    }

    async fn evaluate(&self, script: &str) -> Result<Value, ScrapeError> {
        match self.active() {
            Some(Scenario::Channel(data) | Scenario::SlowMisses(data))
                if script == INITIAL_DATA_SCRIPT =>
            {
                Ok(data)
            }
            Some(Scenario::Unresponsive) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Value::Null)
            }
            _ => Ok(Value::Null),
        }
    }

    async fn query_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<ElementSnapshot>, ScrapeError> {
        if self.is_captcha() && selector.contains("recaptcha") {
            return Ok(Some(ElementSnapshot::default()));
        }
        self.miss(timeout).await
    }

    async fn query_selector_all(&self, _selector: &str) -> Result<Vec<ElementSnapshot>, ScrapeError> {
        Ok(Vec::new())
    }

    async fn query_structural(
        &self,
        _path: &str,
        timeout: Duration,
    ) -> Result<Option<ElementSnapshot>, ScrapeError> {
        self.miss(timeout).await
    }

    async fn content(&self) -> Result<String, ScrapeError> {
        Ok("<html><body></body></html>".to_string())
    }

    async fn current_url(&self) -> Result<String, ScrapeError> {
        Ok(self.url.lock().unwrap().clone())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, ScrapeError> {
        Ok(vec![0x89, b'P', b'N', b'G'])
    }

    async fn frames(&self) -> Result<Vec<FrameInfo>, ScrapeError> {
        if self.is_captcha() {
            return Ok(vec![FrameInfo {
                name: "a-recaptcha".into(),
                url: "https://www.google.com/recaptcha/api2/anchor".into(),
            }]);
        }
        Ok(Vec::new())
    }

    async fn click(&self, _selector: &str) -> Result<bool, ScrapeError> {
        Ok(false)
    }

    async fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Settings with no pacing delay and short DOM waits.
pub fn fast_settings() -> CrawlSettings {
    CrawlSettings {
        attempt_timeout: Duration::from_secs(5),
        max_retries: 5,
        min_concurrency: 1,
        max_concurrency: 2,
        max_processed: 1000,
        save_partial_results: true,
        rate: RateSettings {
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            ..RateSettings::default()
        },
        extractor: ExtractorSettings {
            dom_timeout: Duration::from_millis(10),
            dom_budget: Duration::from_secs(1),
            snapshot_dir: None,
        },
    }
}

/// Collaborators wired to in-memory sinks.
pub struct Harness {
    pub browser: Arc<FakeBrowser>,
    pub sink: Arc<MemorySink>,
    pub failures: Arc<MemoryFailureSink>,
    pub sessions: Arc<SessionPool>,
}

impl Harness {
    pub fn new(browser: FakeBrowser) -> Self {
        Self {
            browser: Arc::new(browser),
            sink: Arc::new(MemorySink::new()),
            failures: Arc::new(MemoryFailureSink::new()),
            sessions: Arc::new(SessionPool::new(&[])),
        }
    }

    pub fn deps(&self) -> CrawlDeps {
        CrawlDeps {
            browser: self.browser.clone(),
            sink: self.sink.clone(),
            failures: self.failures.clone(),
            sessions: Arc::clone(&self.sessions),
        }
    }
}
