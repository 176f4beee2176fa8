//! Plain HTTP page loader.
//!
//! Fetches the about page without running JavaScript. The bootstrap object is
//! read from inline script, selectors run against the static markup with
//! `scraper`, and the consent wall is pre-accepted through a cookie. Structural
//! (XPath) queries, screenshots and clicks are not available.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tokio::sync::Mutex;

use super::session::{Session, SessionPool};
use super::Browser;
use crate::config::Config;
use crate::error_handling::{InitializationError, ScrapeError};
use crate::extract::{
    extract_bootstrap_object, ChannelPage, ElementSnapshot, FrameInfo, NavigationResponse,
};
use crate::initialization::init_client;
use crate::utils::parse_selector_lenient;

/// Prefix of scripts the loader can answer: a read of a global variable.
const WINDOW_PREFIX: &str = "window.";

/// HTTP-backed [`Browser`] with one client per session.
pub struct HttpBrowser {
    clients: HashMap<usize, reqwest::Client>,
}

impl HttpBrowser {
    /// Builds one client per session in the pool.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::HttpClientError` if any proxy URL is invalid.
    pub fn new(config: &Config, sessions: &SessionPool) -> Result<Self, InitializationError> {
        let mut clients = HashMap::new();
        for session in sessions.sessions() {
            clients.insert(session.id, init_client(config, session.proxy.as_deref())?);
        }
        Ok(Self { clients })
    }

    /// Uses the same client for every session.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            clients: HashMap::from([(usize::MAX, client)]),
        }
    }

    fn client_for(&self, session: &Session) -> Option<&reqwest::Client> {
        self.clients
            .get(&session.id)
            .or_else(|| self.clients.get(&usize::MAX))
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    async fn open_page(&self, session: &Session) -> Result<Box<dyn ChannelPage>, ScrapeError> {
        let client = self
            .client_for(session)
            .ok_or_else(|| ScrapeError::Browser(format!("no HTTP client for session {}", session.id)))?;
        Ok(Box::new(HttpPage::new(client.clone())))
    }
}

#[derive(Debug, Default)]
struct Loaded {
    url: String,
    html: String,
}

/// A page backed by one fetched document.
pub struct HttpPage {
    client: reqwest::Client,
    loaded: Mutex<Option<Loaded>>,
}

fn snapshot(element: ElementRef<'_>) -> ElementSnapshot {
    ElementSnapshot {
        text: Some(element.text().collect::<String>()),
        attributes: element
            .value()
            .attrs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    }
}

fn select_all(html: &str, selector: &Selector) -> Vec<ElementSnapshot> {
    Html::parse_document(html).select(selector).map(snapshot).collect()
}

impl HttpPage {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            loaded: Mutex::new(None),
        }
    }

    /// Builds a page from markup already in hand.
    pub fn from_markup(client: reqwest::Client, url: &str, html: &str) -> Self {
        Self {
            client,
            loaded: Mutex::new(Some(Loaded {
                url: url.to_string(),
                html: html.to_string(),
            })),
        }
    }

    async fn with_html<T>(&self, f: impl FnOnce(&str) -> T) -> Option<T> {
        let loaded = self.loaded.lock().await;
        loaded.as_ref().map(|l| f(&l.html))
    }
}

#[async_trait]
impl ChannelPage for HttpPage {
    async fn navigate(&self, url: &str) -> Result<NavigationResponse, ScrapeError> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let html = response.text().await?;
        debug!("Fetched {} ({} bytes, status {})", final_url, html.len(), status);
        *self.loaded.lock().await = Some(Loaded {
            url: final_url,
            html,
        });
        Ok(NavigationResponse {
            status: Some(status),
        })
    }

    async fn evaluate(&self, script: &str) -> Result<Value, ScrapeError> {
        let Some(var_name) = script.trim().strip_prefix(WINDOW_PREFIX) else {
            return Err(ScrapeError::Browser(format!(
                "HTTP loader cannot evaluate script: {script}"
            )));
        };
        Ok(self
            .with_html(|html| extract_bootstrap_object(html, var_name))
            .await
            .flatten()
            .unwrap_or(Value::Null))
    }

    async fn query_selector(
        &self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<Option<ElementSnapshot>, ScrapeError> {
        let Some(parsed) = parse_selector_lenient(selector) else {
            return Ok(None);
        };
        Ok(self
            .with_html(|html| Html::parse_document(html).select(&parsed).next().map(snapshot))
            .await
            .flatten())
    }

    async fn query_selector_all(&self, selector: &str) -> Result<Vec<ElementSnapshot>, ScrapeError> {
        let Some(parsed) = parse_selector_lenient(selector) else {
            return Ok(Vec::new());
        };
        Ok(self
            .with_html(|html| select_all(html, &parsed))
            .await
            .unwrap_or_default())
    }

    async fn query_structural(
        &self,
        _path: &str,
        _timeout: Duration,
    ) -> Result<Option<ElementSnapshot>, ScrapeError> {
        Ok(None)
    }

    async fn content(&self) -> Result<String, ScrapeError> {
        self.with_html(str::to_string)
            .await
            .ok_or_else(|| ScrapeError::Browser("no document loaded".into()))
    }

    async fn current_url(&self) -> Result<String, ScrapeError> {
        let loaded = self.loaded.lock().await;
        loaded
            .as_ref()
            .map(|l| l.url.clone())
            .ok_or_else(|| ScrapeError::Browser("no document loaded".into()))
    }

    async fn screenshot(&self) -> Result<Vec<u8>, ScrapeError> {
        Err(ScrapeError::Browser(
            "screenshots require the chromium loader".into(),
        ))
    }

    async fn frames(&self) -> Result<Vec<FrameInfo>, ScrapeError> {
        let Some(iframe) = parse_selector_lenient("iframe") else {
            return Ok(Vec::new());
        };
        let frames = self
            .with_html(|html| {
                select_all(html, &iframe)
                    .into_iter()
                    .map(|el| FrameInfo {
                        name: el.attribute("name").unwrap_or_default().to_string(),
                        url: el.attribute("src").unwrap_or_default().to_string(),
                    })
                    .collect()
            })
            .await
            .unwrap_or_default();
        Ok(frames)
    }

    async fn click(&self, _selector: &str) -> Result<bool, ScrapeError> {
        Ok(false)
    }

    async fn close(&self) {
        *self.loaded.lock().await = None;
    }
}
