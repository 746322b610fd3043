//! Progress display for the harvest run.
//!
//! Uses `indicatif` for a spinner during the index fetch and a
//! completion-ordered bar over the sub-sitemap pool.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner shown during the sequential index fetch.
pub fn index_spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("  {spinner:.cyan} {msg}")
            .unwrap()
            .tick_chars("\u{25b8}\u{25b9}\u{25b8}\u{25b9}\u{25b8}"),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// Bar over the sub-sitemap pool; advances as fetches complete.
pub fn sitemap_bar(total: usize) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::with_template(
            "  {spinner:.cyan} Processing sitemaps [{bar:36}] {pos}/{len} {msg}",
        )
        .unwrap()
        .progress_chars("\u{2588}\u{2591}\u{2591}"),
    );
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// Replace the bar with a final line.
pub fn finish(bar: &ProgressBar, message: String) {
    bar.set_style(ProgressStyle::with_template("  {msg}").unwrap());
    bar.finish_with_message(message);
}
