//! HTTP client initialization.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, COOKIE};
use reqwest::ClientBuilder;

use crate::config::{Config, CONNECT_TIMEOUT};
use crate::error_handling::InitializationError;

/// Cookie that pre-accepts the consent interstitial for plain HTTP fetches.
const CONSENT_COOKIE: &str = "CONSENT=YES+cb; SOCS=CAI";

/// Pages are requested in English so count and date wording is predictable.
const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.9";

/// Initializes an HTTP client for channel pages and search.
///
/// Creates a `reqwest::Client` configured with:
/// - User-Agent header from config
/// - English `Accept-Language` and the consent cookie
/// - Request timeout equal to the attempt timeout
/// - The given proxy, if any
///
/// # Arguments
///
/// * `config` - Run configuration (user agent, attempt timeout)
/// * `proxy` - Proxy URL for this network identity, or `None` for direct
///
/// # Errors
///
/// Returns `InitializationError::HttpClientError` if the proxy URL is invalid or
/// client creation fails.
pub fn init_client(config: &Config, proxy: Option<&str>) -> Result<reqwest::Client, InitializationError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));
    headers.insert(COOKIE, HeaderValue::from_static(CONSENT_COOKIE));

    let mut builder = ClientBuilder::new()
        .timeout(Duration::from_secs(config.attempt_timeout_secs))
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(config.user_agent.clone())
        .default_headers(headers);
    if let Some(proxy) = proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy)?);
    }
    Ok(builder.build()?)
}
