//! Headless Chromium page loader (requires the `browser` feature).
//!
//! One Chromium process per session, so each proxy gets its own browser. DOM
//! queries run as injected scripts that return owned element snapshots, which
//! keeps CSS and XPath lookups on a single code path.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::session::{Session, SessionPool};
use super::Browser;
use crate::config::Config;
use crate::error_handling::{InitializationError, ScrapeError};
use crate::extract::{ChannelPage, ElementSnapshot, FrameInfo, NavigationResponse};

/// Poll interval while waiting for a selector to appear.
const QUERY_POLL_INTERVAL: Duration = Duration::from_millis(100);

const WINDOW_WIDTH: u32 = 1366;
const WINDOW_HEIGHT: u32 = 900;

/// Status of the main document, read from the navigation timing entry.
const NAVIGATION_STATUS_SCRIPT: &str = r#"(() => {
    const entry = performance.getEntriesByType('navigation')[0];
    return entry && entry.responseStatus ? entry.responseStatus : null;
})()"#;

const FRAMES_SCRIPT: &str = r#"Array.from(document.querySelectorAll('iframe'))
    .map(f => ({ name: f.name || '', url: f.src || '' }))"#;

fn cdp_error(e: chromiumoxide::error::CdpError) -> ScrapeError {
    ScrapeError::Browser(e.to_string())
}

/// Script returning snapshots of every element matching a CSS selector.
fn css_query_script(selector: &str) -> String {
    let quoted = serde_json::to_string(selector).unwrap_or_else(|_| "\"\"".into());
    format!(
        r#"(() => {{
            let els = [];
            try {{ els = Array.from(document.querySelectorAll({quoted})); }} catch (_) {{ return []; }}
            return els.map(e => ({{
                text: e.innerText ?? e.textContent,
                attributes: Object.fromEntries(Array.from(e.attributes).map(a => [a.name, a.value]))
            }}));
        }})()"#
    )
}

/// Script returning a snapshot of the first node matching an XPath expression.
fn xpath_query_script(path: &str) -> String {
    let quoted = serde_json::to_string(path).unwrap_or_else(|_| "\"\"".into());
    format!(
        r#"(() => {{
            let node = null;
            try {{
                node = document.evaluate({quoted}, document, null,
                    XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue;
            }} catch (_) {{ return []; }}
            if (!node) return [];
            const attrs = node.attributes ? Array.from(node.attributes).map(a => [a.name, a.value]) : [];
            return [{{ text: node.innerText ?? node.textContent, attributes: Object.fromEntries(attrs) }}];
        }})()"#
    )
}

#[derive(Debug, Deserialize)]
struct JsElement {
    text: Option<String>,
    #[serde(default)]
    attributes: HashMap<String, String>,
}

impl From<JsElement> for ElementSnapshot {
    fn from(el: JsElement) -> Self {
        ElementSnapshot {
            text: el.text,
            attributes: el.attributes,
        }
    }
}

struct Instance {
    browser: CdpBrowser,
    handler: JoinHandle<()>,
}

/// Chromium-backed [`Browser`].
pub struct ChromiumBrowser {
    instances: Mutex<HashMap<usize, Instance>>,
}

impl ChromiumBrowser {
    /// Launches one Chromium process per session.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::BrowserError` if Chromium cannot be found or
    /// fails to start.
    pub async fn launch(config: &Config, sessions: &SessionPool) -> Result<Self, InitializationError> {
        let mut instances = HashMap::new();
        for session in sessions.sessions() {
            info!(
                "Launching Chromium for session {} (headless={})",
                session.id, config.headless
            );
            let mut builder = BrowserConfig::builder()
                .window_size(WINDOW_WIDTH, WINDOW_HEIGHT)
                .request_timeout(config.attempt_timeout())
                .arg(format!("--user-agent={}", config.user_agent))
                .arg("--lang=en-US")
                .arg("--disable-blink-features=AutomationControlled")
                .arg("--disable-dev-shm-usage")
                .arg("--no-first-run")
                .arg("--no-default-browser-check")
                .arg("--no-sandbox")
                .arg("--disable-gpu");
            // with_head means NOT headless
            if !config.headless {
                builder = builder.with_head();
            }
            if let Some(proxy) = &session.proxy {
                builder = builder.arg(format!("--proxy-server={}", proxy));
            }
            let browser_config = builder.build().map_err(InitializationError::BrowserError)?;

            let (browser, mut handler) = CdpBrowser::launch(browser_config)
                .await
                .map_err(|e| InitializationError::BrowserError(e.to_string()))?;
            let handler = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });
            instances.insert(session.id, Instance { browser, handler });
        }
        Ok(Self {
            instances: Mutex::new(instances),
        })
    }
}

#[async_trait]
impl Browser for ChromiumBrowser {
    async fn open_page(&self, session: &Session) -> Result<Box<dyn ChannelPage>, ScrapeError> {
        let instances = self.instances.lock().await;
        let instance = instances
            .get(&session.id)
            .ok_or_else(|| ScrapeError::Browser(format!("no Chromium for session {}", session.id)))?;
        let page = instance
            .browser
            .new_page("about:blank")
            .await
            .map_err(cdp_error)?;
        Ok(Box::new(ChromiumPage { page }))
    }

    async fn shutdown(&self) {
        let mut instances = self.instances.lock().await;
        for (id, mut instance) in instances.drain() {
            if let Err(e) = instance.browser.close().await {
                warn!("Failed to close Chromium for session {}: {}", id, e);
            }
            let _ = instance.browser.wait().await;
            instance.handler.abort();
        }
    }
}

/// One Chromium tab.
pub struct ChromiumPage {
    page: Page,
}

impl ChromiumPage {
    async fn eval_json(&self, script: String) -> Result<Value, ScrapeError> {
        let result = self.page.evaluate(script).await.map_err(cdp_error)?;
        // Undefined results do not deserialize; treat them as null.
        Ok(result.into_value::<Value>().unwrap_or(Value::Null))
    }

    async fn snapshots(&self, script: String) -> Result<Vec<ElementSnapshot>, ScrapeError> {
        let value = self.eval_json(script).await?;
        let elements: Vec<JsElement> = serde_json::from_value(value).unwrap_or_default();
        Ok(elements.into_iter().map(ElementSnapshot::from).collect())
    }

    /// Polls `script` until it yields an element or `timeout` passes.
    async fn wait_for_first(
        &self,
        script: String,
        timeout: Duration,
    ) -> Result<Option<ElementSnapshot>, ScrapeError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(first) = self.snapshots(script.clone()).await?.into_iter().next() {
                return Ok(Some(first));
            }
            if tokio::time::Instant::now() + QUERY_POLL_INTERVAL > deadline {
                return Ok(None);
            }
            tokio::time::sleep(QUERY_POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl ChannelPage for ChromiumPage {
    async fn navigate(&self, url: &str) -> Result<NavigationResponse, ScrapeError> {
        self.page.goto(url).await.map_err(cdp_error)?;
        let status = self
            .eval_json(NAVIGATION_STATUS_SCRIPT.to_string())
            .await
            .ok()
            .and_then(|v| v.as_u64())
            .and_then(|s| u16::try_from(s).ok());
        debug!("Navigated to {} (status {:?})", url, status);
        Ok(NavigationResponse { status })
    }

    async fn evaluate(&self, script: &str) -> Result<Value, ScrapeError> {
        self.eval_json(script.to_string()).await
    }

    async fn query_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<ElementSnapshot>, ScrapeError> {
        self.wait_for_first(css_query_script(selector), timeout).await
    }

    async fn query_selector_all(&self, selector: &str) -> Result<Vec<ElementSnapshot>, ScrapeError> {
        self.snapshots(css_query_script(selector)).await
    }

    async fn query_structural(
        &self,
        path: &str,
        timeout: Duration,
    ) -> Result<Option<ElementSnapshot>, ScrapeError> {
        self.wait_for_first(xpath_query_script(path), timeout).await
    }

    async fn content(&self) -> Result<String, ScrapeError> {
        self.page.content().await.map_err(cdp_error)
    }

    async fn current_url(&self) -> Result<String, ScrapeError> {
        Ok(self.page.url().await.map_err(cdp_error)?.unwrap_or_default())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, ScrapeError> {
        self.page
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await
            .map_err(cdp_error)
    }

    async fn frames(&self) -> Result<Vec<FrameInfo>, ScrapeError> {
        #[derive(Deserialize)]
        struct JsFrame {
            name: String,
            url: String,
        }
        let value = self.eval_json(FRAMES_SCRIPT.to_string()).await?;
        let frames: Vec<JsFrame> = serde_json::from_value(value).unwrap_or_default();
        Ok(frames
            .into_iter()
            .map(|f| FrameInfo {
                name: f.name,
                url: f.url,
            })
            .collect())
    }

    async fn click(&self, selector: &str) -> Result<bool, ScrapeError> {
        let Ok(element) = self.page.find_element(selector).await else {
            return Ok(false);
        };
        element.click().await.map_err(cdp_error)?;
        Ok(true)
    }

    async fn close(&self) {
        if let Err(e) = self.page.clone().close().await {
            debug!("Failed to close page: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_scripts_quote_input() {
        let script = css_query_script("a[href*='x\"y']");
        assert!(script.contains(r#"querySelectorAll("a[href*='x\"y']")"#));
        let script = xpath_query_script("//td[contains(., 'Joined')]");
        assert!(script.contains(r#""//td[contains(., 'Joined')]""#));
    }

    #[test]
    fn test_js_element_conversion() {
        let value = serde_json::json!([{"text": "Maker", "attributes": {"href": "/x"}}, {"text": null}]);
        let elements: Vec<JsElement> = serde_json::from_value(value).unwrap();
        let snapshots: Vec<ElementSnapshot> = elements.into_iter().map(Into::into).collect();
        assert_eq!(snapshots[0].trimmed_text(), Some("Maker"));
        assert_eq!(snapshots[0].attribute("href"), Some("/x"));
        assert_eq!(snapshots[1].text, None);
    }
}
