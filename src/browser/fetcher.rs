//! chromiumoxide-backed sitemap fetcher.
//!
//! One Chromium process per [`BrowserMode`], one page per fetch. Pages are
//! wrapped in an RAII guard because chromiumoxide's `Page` has no `Drop`
//! and leaks CDP connections unless explicitly closed.

use super::{launcher, BrowserMode, SitemapFetcher};
use crate::error::HarvestError;
use crate::stealth::fingerprint;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Expression polled until a <loc> element exists in the DOM. Works both
/// for raw XML documents and for Chromium's XML-viewer rendering.
const LOC_PRESENT_JS: &str = "document.getElementsByTagName('loc').length > 0";

/// How often the DOM is polled while waiting for a <loc> element.
const LOC_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Launch-time settings for a [`BrowserFetcher`].
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Explicit Chromium path; discovery runs when absent.
    pub chromium_path: Option<PathBuf>,
    /// Pass --no-sandbox (also forced on by Docker detection).
    pub no_sandbox: bool,
    /// Upper bound on page navigation.
    pub nav_timeout: Duration,
    /// Upper bound on waiting for a <loc> element after navigation.
    pub loc_timeout: Duration,
}

/// RAII guard ensuring a page is closed on every exit path.
struct PageGuard {
    page: Option<Page>,
    url: String,
}

impl PageGuard {
    fn new(page: Page, url: &str) -> Self {
        Self {
            page: Some(page),
            url: url.to_string(),
        }
    }

    fn page(&self) -> &Page {
        self.page.as_ref().expect("page already closed")
    }

    /// Preferred cleanup path: close the page and surface nothing — a
    /// failed close is the browser's problem at this point.
    async fn close(mut self) {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                warn!("failed to close page for {}: {e}", self.url);
            }
        }
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        // Error-path fallback: Drop cannot await, so hand the close to
        // the runtime.
        if let Some(page) = self.page.take() {
            let url = std::mem::take(&mut self.url);
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    if let Err(e) = page.close().await {
                        debug!("background page close failed for {url}: {e}");
                    }
                });
            }
        }
    }
}

/// A running stealth-patched Chromium that fetches sitemap pages.
pub struct BrowserFetcher {
    browser: Mutex<Option<Browser>>,
    handler_task: JoinHandle<()>,
    nav_timeout: Duration,
    loc_timeout: Duration,
}

impl BrowserFetcher {
    /// Launch a Chromium process in the given mode with the stealth
    /// launch flags applied.
    pub async fn launch(mode: BrowserMode, opts: &LaunchOptions) -> Result<Self, HarvestError> {
        let executable = opts
            .chromium_path
            .clone()
            .or_else(launcher::find_chromium)
            .ok_or(HarvestError::ChromiumNotFound)?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(executable)
            .args(fingerprint::launch_flags());
        if !mode.is_headless() {
            builder = builder.with_head();
        }
        if opts.no_sandbox || launcher::needs_no_sandbox() {
            builder = builder.no_sandbox();
        }
        let config = builder.build().map_err(HarvestError::BrowserLaunch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| HarvestError::BrowserLaunch(e.to_string()))?;

        // CDP event loop; ends when the browser closes.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        debug!("launched {mode:?} browser");
        Ok(Self {
            browser: Mutex::new(Some(browser)),
            handler_task,
            nav_timeout: opts.nav_timeout,
            loc_timeout: opts.loc_timeout,
        })
    }

    /// Close the browser process and stop the CDP handler loop.
    pub async fn close(&self) {
        if let Some(mut browser) = self.browser.lock().await.take() {
            if let Err(e) = browser.close().await {
                warn!("failed to close browser: {e}");
            }
            let _ = browser.wait().await;
        }
        self.handler_task.abort();
    }

    async fn new_page(&self, url: &str) -> Result<Page, HarvestError> {
        let guard = self.browser.lock().await;
        let browser = guard.as_ref().ok_or_else(|| HarvestError::PageCreate {
            url: url.to_string(),
            message: "browser already closed".to_string(),
        })?;
        browser
            .new_page("about:blank")
            .await
            .map_err(|e| HarvestError::PageCreate {
                url: url.to_string(),
                message: e.to_string(),
            })
    }

    /// Wait until a <loc> element exists in the page DOM.
    async fn wait_for_loc(&self, page: &Page) -> bool {
        let deadline = tokio::time::Instant::now() + self.loc_timeout;
        loop {
            let present = page
                .evaluate(LOC_PRESENT_JS)
                .await
                .ok()
                .and_then(|r| r.into_value::<bool>().ok())
                .unwrap_or(false);
            if present {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(LOC_POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl SitemapFetcher for BrowserFetcher {
    async fn fetch(&self, url: &str) -> Result<String, HarvestError> {
        let page = self.new_page(url).await?;
        let guard = PageGuard::new(page, url);

        // Register the fingerprint patch before any document loads.
        let patch = AddScriptToEvaluateOnNewDocumentParams::builder()
            .source(fingerprint::patch_script())
            .build()
            .map_err(|e| HarvestError::PageCreate {
                url: url.to_string(),
                message: e,
            })?;
        if let Err(e) = guard.page().execute(patch).await {
            guard.close().await;
            return Err(HarvestError::PageCreate {
                url: url.to_string(),
                message: e.to_string(),
            });
        }

        match tokio::time::timeout(self.nav_timeout, guard.page().goto(url)).await {
            Err(_) => {
                guard.close().await;
                return Err(HarvestError::NavigationTimeout {
                    url: url.to_string(),
                    ms: self.nav_timeout.as_millis() as u64,
                });
            }
            Ok(Err(e)) => {
                guard.close().await;
                return Err(HarvestError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                });
            }
            Ok(Ok(_)) => {}
        }

        if !self.wait_for_loc(guard.page()).await {
            guard.close().await;
            return Err(HarvestError::LocWaitTimeout {
                url: url.to_string(),
                ms: self.loc_timeout.as_millis() as u64,
            });
        }

        let content = guard.page().content().await;
        guard.close().await;

        content.map_err(|e| HarvestError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}
