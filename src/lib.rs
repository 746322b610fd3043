//! Lochound — stealth-browser sitemap harvester.
//!
//! Drives a stealth-patched Chromium through an XML sitemap index:
//! the index is fetched sequentially with a visible browser, discovered
//! sub-sitemaps are fetched concurrently in headless mode through a
//! bounded worker pool, and every `<loc>` URL lands deduplicated and
//! sorted in a newline-delimited text file.

pub mod audit;
pub mod browser;
pub mod cli;
pub mod error;
pub mod harvest;
pub mod pool;
pub mod sitemap;
pub mod stealth;

pub use error::HarvestError;
pub use harvest::{HarvestConfig, HarvestEvent, HarvestReport, Harvester};
