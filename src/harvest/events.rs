//! Progress events and the final run report.

use serde::Serialize;
use std::path::PathBuf;

/// Progress emitted by the harvester while a run is in flight.
///
/// Streamed to the UI over an unbounded channel; sub-sitemap events
/// arrive in completion order.
#[derive(Debug, Clone)]
pub enum HarvestEvent {
    /// Free-form phase description.
    Status(String),
    /// The index page was fetched and parsed.
    IndexFetched { sub_sitemaps: usize },
    /// One sub-sitemap finished, successfully or not.
    SitemapDone {
        url: String,
        /// <loc> values found in the document.
        found: usize,
        /// New URLs after dedup and filtering.
        new: usize,
        error: Option<String>,
    },
}

/// Summary of a finished harvest run.
#[derive(Debug, Clone, Serialize)]
pub struct HarvestReport {
    /// Sub-sitemap URLs discovered in the index.
    pub sub_sitemaps: usize,
    /// Sub-sitemaps fetched successfully.
    pub fetched: usize,
    /// Sub-sitemaps that failed and contributed nothing.
    pub failed: usize,
    /// Unique URLs written to the output file.
    pub unique_urls: usize,
    pub output_path: PathBuf,
    pub elapsed_secs: f64,
}
