//! The harvest pipeline: index fetch, concurrent sub-sitemap fetches,
//! global dedup, sorted output.

pub mod config;
pub mod events;
pub mod runner;
pub mod urlset;
pub mod writer;

pub use config::HarvestConfig;
pub use events::{HarvestEvent, HarvestReport};
pub use runner::Harvester;
pub use urlset::UrlSet;
