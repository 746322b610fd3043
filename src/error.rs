//! Typed errors for the harvest pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while fetching and harvesting sitemaps.
///
/// The caller decides criticality: an error on the index fetch aborts the
/// run, the same error on a sub-sitemap contributes an empty URL list and
/// the run continues.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// No Chromium executable could be located.
    #[error("no Chromium executable found — run 'lochound install' or set LOCHOUND_CHROMIUM_PATH")]
    ChromiumNotFound,

    /// The browser process failed to launch.
    #[error("failed to launch browser: {0}")]
    BrowserLaunch(String),

    /// A new page could not be created in the running browser.
    #[error("failed to open page for {url}: {message}")]
    PageCreate { url: String, message: String },

    /// Navigation did not complete within the timeout.
    #[error("navigation to {url} timed out after {ms}ms")]
    NavigationTimeout { url: String, ms: u64 },

    /// Navigation failed outright (DNS, TLS, net error).
    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    /// No <loc> element appeared in the DOM within the timeout.
    #[error("no <loc> element appeared on {url} within {ms}ms")]
    LocWaitTimeout { url: String, ms: u64 },

    /// The sitemap index page could not be retrieved at all.
    ///
    /// This is the critical failure mode: either a network issue or a
    /// change in the site's protection.
    #[error("failed to retrieve sitemap index {url}: {reason}")]
    IndexUnavailable { url: String, reason: String },

    /// The index page was retrieved but contained no <loc> tags.
    #[error("sitemap index {url} was retrieved but contained no <loc> URLs")]
    EmptyIndex { url: String },

    /// The output file could not be written.
    #[error("failed to write output file {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
