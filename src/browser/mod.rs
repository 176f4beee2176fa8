//! Page loaders and network identities.
//!
//! The crawl only depends on the [`Browser`] trait. Two loaders ship with the
//! crate: a plain HTTP loader (always available) and headless Chromium
//! (behind the `browser` cargo feature).

#[cfg(feature = "browser")]
mod chromium;
mod http;
mod session;

use async_trait::async_trait;

use crate::error_handling::ScrapeError;
use crate::extract::ChannelPage;

#[cfg(feature = "browser")]
pub use chromium::{ChromiumBrowser, ChromiumPage};
pub use http::{HttpBrowser, HttpPage};
pub use session::{Session, SessionPool};

/// Opens pages bound to a network identity.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Opens a fresh page for one attempt. The caller closes it.
    async fn open_page(&self, session: &Session) -> Result<Box<dyn ChannelPage>, ScrapeError>;

    /// Releases runtime resources at the end of a crawl.
    async fn shutdown(&self) {}
}
