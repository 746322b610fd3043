//! Stealth-patched Chromium fetching.
//!
//! One browser process per mode, one page per fetch. The [`SitemapFetcher`]
//! trait is the seam the harvest pipeline is written against, so tests run
//! the full pipeline without a browser.

pub mod fetcher;
pub mod launcher;

pub use fetcher::BrowserFetcher;

use crate::error::HarvestError;
use async_trait::async_trait;

/// Whether the browser runs with a visible window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserMode {
    /// Visible window. Used for the index fetch, where tripping the
    /// site's protection is most expensive.
    Headful,
    /// No window. Used for sub-sitemap throughput.
    Headless,
}

impl BrowserMode {
    pub fn is_headless(&self) -> bool {
        matches!(self, BrowserMode::Headless)
    }
}

/// Fetches the content of one sitemap URL.
#[async_trait]
pub trait SitemapFetcher: Send + Sync {
    /// Fetch the page and return its content once a `<loc>` element is
    /// present in the DOM.
    async fn fetch(&self, url: &str) -> Result<String, HarvestError>;
}
