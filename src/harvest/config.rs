//! Harvest run configuration.

use crate::browser::fetcher::LaunchOptions;
use regex::Regex;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Default sitemap index to harvest.
pub const DEFAULT_INDEX_URL: &str = "https://octopart.com/product-sitemap-index.xml";

/// Default concurrent headless fetches.
pub const DEFAULT_WORKERS: usize = 8;

/// Default wait for a <loc> element to appear in the DOM.
pub const DEFAULT_LOC_TIMEOUT: Duration = Duration::from_secs(60);

/// Default bound on page navigation.
pub const DEFAULT_NAV_TIMEOUT: Duration = Duration::from_secs(45);

/// Settings for one harvest run.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// The sitemap index URL, fetched first with a visible browser.
    pub index_url: String,
    /// Output file; derived from the index host when absent.
    pub output_path: Option<PathBuf>,
    /// Concurrent headless fetches. Clamped to at least 1.
    pub workers: usize,
    /// Wait for a <loc> element after navigation.
    pub loc_timeout: Duration,
    /// Navigation timeout per page.
    pub nav_timeout: Duration,
    /// Fetch the index headless too, instead of with a visible window.
    pub headless_index: bool,
    /// Keep only URLs matching this pattern.
    pub filter: Option<Regex>,
    /// Explicit Chromium executable; discovery runs when absent.
    pub chromium_path: Option<PathBuf>,
    /// Launch Chromium with --no-sandbox.
    pub no_sandbox: bool,
    /// Audit log location; `~/.lochound/harvest.jsonl` when absent.
    pub audit_path: Option<PathBuf>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            index_url: DEFAULT_INDEX_URL.to_string(),
            output_path: None,
            workers: DEFAULT_WORKERS,
            loc_timeout: DEFAULT_LOC_TIMEOUT,
            nav_timeout: DEFAULT_NAV_TIMEOUT,
            headless_index: false,
            filter: None,
            chromium_path: None,
            no_sandbox: false,
            audit_path: None,
        }
    }
}

impl HarvestConfig {
    /// Resolve the output path, deriving `<host-label>_product_urls.txt`
    /// from the index URL when none was given.
    pub fn resolved_output_path(&self) -> PathBuf {
        if let Some(path) = &self.output_path {
            return path.clone();
        }
        let label = Url::parse(&self.index_url)
            .ok()
            .and_then(|u| u.host_str().map(String::from))
            .and_then(|host| host.split('.').next().map(String::from))
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| "sitemap".to_string());
        PathBuf::from(format!("{label}_product_urls.txt"))
    }

    /// Browser launch settings derived from this config.
    pub fn launch_options(&self) -> LaunchOptions {
        LaunchOptions {
            chromium_path: self.chromium_path.clone(),
            no_sandbox: self.no_sandbox,
            nav_timeout: self.nav_timeout,
            loc_timeout: self.loc_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_derived_from_index_host() {
        let config = HarvestConfig::default();
        assert_eq!(
            config.resolved_output_path(),
            PathBuf::from("octopart_product_urls.txt")
        );
    }

    #[test]
    fn test_output_path_explicit_wins() {
        let config = HarvestConfig {
            output_path: Some(PathBuf::from("/tmp/urls.txt")),
            ..Default::default()
        };
        assert_eq!(config.resolved_output_path(), PathBuf::from("/tmp/urls.txt"));
    }

    #[test]
    fn test_output_path_unparseable_index_falls_back() {
        let config = HarvestConfig {
            index_url: "not a url".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.resolved_output_path(),
            PathBuf::from("sitemap_product_urls.txt")
        );
    }
}
