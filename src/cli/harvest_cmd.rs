//! `lochound harvest` — run the full sitemap harvest.

use crate::cli::output::{self, Styled};
use crate::cli::progress;
use crate::error::HarvestError;
use crate::harvest::{HarvestConfig, HarvestEvent, HarvestReport, Harvester};
use anyhow::Result;
use tracing::info;

/// Exit code when the index page could not be retrieved.
const EXIT_INDEX_UNAVAILABLE: i32 = 2;
/// Exit code when the index was retrieved but held no <loc> URLs.
const EXIT_EMPTY_INDEX: i32 = 3;

/// Run a harvest with progress display and a final summary.
pub async fn run(config: HarvestConfig) -> Result<()> {
    let s = Styled::new();
    let show_progress = !output::is_quiet() && !output::is_json();

    info!("harvesting {}", config.index_url);
    let headless_index = config.headless_index;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let harvester = Harvester::new(config).with_events(tx);

    // The harvester (and with it the event sender) drops when the task
    // finishes, which ends the receive loop below.
    let run = tokio::spawn(async move { harvester.run().await });

    let spinner = if show_progress {
        let mode = if headless_index { "headless" } else { "visible browser" };
        Some(progress::index_spinner(&format!(
            "Fetching sitemap index ({mode})..."
        )))
    } else {
        None
    };

    let mut bar = None;
    while let Some(event) = rx.recv().await {
        if !show_progress {
            continue;
        }
        match event {
            HarvestEvent::Status(msg) => {
                if output::is_verbose() {
                    if let Some(spinner) = &spinner {
                        spinner.set_message(msg);
                    }
                }
            }
            HarvestEvent::IndexFetched { sub_sitemaps } => {
                if let Some(spinner) = &spinner {
                    progress::finish(
                        spinner,
                        format!(
                            "{} Index fetched — {sub_sitemaps} sub-sitemaps discovered",
                            s.ok_sym()
                        ),
                    );
                }
                bar = Some(progress::sitemap_bar(sub_sitemaps));
            }
            HarvestEvent::SitemapDone { url, new, error, .. } => {
                if let Some(bar) = &bar {
                    bar.inc(1);
                    match error {
                        None => bar.set_message(format!("+{new} new")),
                        Some(e) => {
                            bar.set_message(format!("{} skipped", s.yellow("!")));
                            if output::is_verbose() {
                                bar.println(format!("  {} {url}: {e}", s.warn_sym()));
                            }
                        }
                    }
                }
            }
        }
    }

    let result = run.await.expect("harvest task panicked");

    match result {
        Ok(report) => {
            if let Some(bar) = &bar {
                progress::finish(
                    bar,
                    format!("{} All sitemaps processed", s.ok_sym()),
                );
            }
            print_summary(&s, &report);
            Ok(())
        }
        Err(e) => {
            if let Some(bar) = &bar {
                bar.finish_and_clear();
            }
            if let Some(spinner) = &spinner {
                spinner.finish_and_clear();
            }
            fail(&s, e)
        }
    }
}

fn print_summary(s: &Styled, report: &HarvestReport) {
    if output::is_json() {
        if let Ok(value) = serde_json::to_value(report) {
            output::print_json(&value);
        }
        return;
    }
    if output::is_quiet() {
        return;
    }

    eprintln!();
    eprintln!("  {}", s.bold("Extraction complete"));
    eprintln!(
        "    Sub-sitemaps:    {} fetched, {} failed (of {})",
        report.fetched, report.failed, report.sub_sitemaps
    );
    eprintln!(
        "    Unique URLs:     {}",
        s.green(&output::format_count(report.unique_urls))
    );
    eprintln!("    Output:          {}", report.output_path.display());
    eprintln!("    Elapsed:         {:.2}s", report.elapsed_secs);
}

/// Print a critical failure and exit non-zero.
fn fail(s: &Styled, e: HarvestError) -> Result<()> {
    match &e {
        HarvestError::IndexUnavailable { url, reason } => {
            eprintln!();
            eprintln!(
                "  {} Failed to retrieve the sitemap index at {url}.",
                s.fail_sym()
            );
            eprintln!("  This could be a network issue or a change in the site's protection.");
            if output::is_verbose() {
                eprintln!("  {}", s.dim(reason));
            }
            std::process::exit(EXIT_INDEX_UNAVAILABLE);
        }
        HarvestError::EmptyIndex { url } => {
            eprintln!();
            eprintln!(
                "  {} The index page at {url} was retrieved, but no sub-sitemap URLs (<loc> tags) were found.",
                s.fail_sym()
            );
            std::process::exit(EXIT_EMPTY_INDEX);
        }
        _ => Err(e.into()),
    }
}
