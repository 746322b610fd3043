//! The harvest pipeline.
//!
//! One sequential visible-browser fetch for the index, a bounded pool of
//! headless fetches for the sub-sitemaps, a shared dedup set, a final
//! sort-and-write.

use super::config::HarvestConfig;
use super::events::{HarvestEvent, HarvestReport};
use super::urlset::UrlSet;
use super::writer;
use crate::audit::AuditLogger;
use crate::browser::{BrowserFetcher, BrowserMode, SitemapFetcher};
use crate::error::HarvestError;
use crate::pool::FetchPool;
use crate::sitemap::{self, SitemapKind};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Drives one harvest run.
pub struct Harvester {
    config: HarvestConfig,
    events: Option<UnboundedSender<HarvestEvent>>,
    audit: Option<Arc<Mutex<AuditLogger>>>,
}

impl Harvester {
    pub fn new(config: HarvestConfig) -> Self {
        // A broken audit log never blocks a harvest.
        let audit_path = config
            .audit_path
            .clone()
            .unwrap_or_else(AuditLogger::default_path);
        let audit = match AuditLogger::open(&audit_path) {
            Ok(logger) => Some(Arc::new(Mutex::new(logger))),
            Err(e) => {
                warn!("audit log unavailable at {}: {e}", audit_path.display());
                None
            }
        };

        Self {
            config,
            events: None,
            audit,
        }
    }

    /// Stream progress events to the given channel.
    pub fn with_events(mut self, sender: UnboundedSender<HarvestEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    fn emit(&self, event: HarvestEvent) {
        if let Some(sender) = &self.events {
            let _ = sender.send(event);
        }
    }

    fn audit_fetch(
        &self,
        phase: &str,
        url: Option<&str>,
        duration_ms: u64,
        status: &str,
        url_count: Option<usize>,
    ) {
        if let Some(audit) = &self.audit {
            if let Ok(mut logger) = audit.lock() {
                if let Err(e) = logger.log_fetch(phase, url, duration_ms, status, url_count) {
                    debug!("audit write failed: {e}");
                }
            }
        }
    }

    /// Run the full pipeline with real browsers.
    ///
    /// The index is fetched with a visible window (unless configured
    /// headless), then a shared headless browser serves the worker pool.
    pub async fn run(&self) -> Result<HarvestReport, HarvestError> {
        let opts = self.config.launch_options();

        let index_mode = if self.config.headless_index {
            BrowserMode::Headless
        } else {
            BrowserMode::Headful
        };

        self.emit(HarvestEvent::Status("launching browser".to_string()));
        let index_fetcher = Arc::new(BrowserFetcher::launch(index_mode, &opts).await?);

        // The headless browser only launches once the index succeeded, so
        // a protection change does not cost a second Chromium process.
        let result = self
            .run_index_phase(index_fetcher.clone() as Arc<dyn SitemapFetcher>)
            .await;
        index_fetcher.close().await;
        let (sub_sitemaps, started) = result?;

        let worker_fetcher = Arc::new(BrowserFetcher::launch(BrowserMode::Headless, &opts).await?);
        let result = self
            .run_worker_phase(
                worker_fetcher.clone() as Arc<dyn SitemapFetcher>,
                sub_sitemaps,
                started,
            )
            .await;
        worker_fetcher.close().await;
        result
    }

    /// Run the pipeline over injected fetchers.
    pub async fn run_with(
        &self,
        index_fetcher: Arc<dyn SitemapFetcher>,
        worker_fetcher: Arc<dyn SitemapFetcher>,
    ) -> Result<HarvestReport, HarvestError> {
        let (sub_sitemaps, started) = self.run_index_phase(index_fetcher).await?;
        self.run_worker_phase(worker_fetcher, sub_sitemaps, started)
            .await
    }

    /// Fetch and parse the index. Returns the sub-sitemap URLs and the
    /// run start instant.
    async fn run_index_phase(
        &self,
        fetcher: Arc<dyn SitemapFetcher>,
    ) -> Result<(Vec<String>, Instant), HarvestError> {
        let started = Instant::now();
        let index_url = self.config.index_url.clone();

        self.emit(HarvestEvent::Status(format!(
            "fetching sitemap index {index_url}"
        )));

        let fetch_started = Instant::now();
        let content = match fetcher.fetch(&index_url).await {
            Ok(content) => content,
            Err(e) => {
                self.audit_fetch(
                    "index",
                    Some(&index_url),
                    fetch_started.elapsed().as_millis() as u64,
                    "error",
                    None,
                );
                return Err(HarvestError::IndexUnavailable {
                    url: index_url,
                    reason: e.to_string(),
                });
            }
        };

        let parsed = sitemap::parse(&content);
        self.audit_fetch(
            "index",
            Some(&index_url),
            fetch_started.elapsed().as_millis() as u64,
            "ok",
            Some(parsed.urls.len()),
        );

        if parsed.urls.is_empty() {
            return Err(HarvestError::EmptyIndex { url: index_url });
        }
        if parsed.kind != SitemapKind::Index {
            debug!("index document parsed as {:?}, harvesting anyway", parsed.kind);
        }

        info!("found {} sub-sitemap URLs in index", parsed.urls.len());
        self.emit(HarvestEvent::IndexFetched {
            sub_sitemaps: parsed.urls.len(),
        });

        Ok((parsed.urls, started))
    }

    /// Fetch every sub-sitemap through the pool, accumulate, sort, write.
    async fn run_worker_phase(
        &self,
        fetcher: Arc<dyn SitemapFetcher>,
        sub_sitemaps: Vec<String>,
        started: Instant,
    ) -> Result<HarvestReport, HarvestError> {
        let total = sub_sitemaps.len();
        self.emit(HarvestEvent::Status(format!(
            "processing {total} sub-sitemaps with {} workers",
            self.config.workers.max(1)
        )));

        let pool = Arc::new(FetchPool::new(fetcher, self.config.workers));
        let urls = Arc::new(UrlSet::new());

        let mut tasks = JoinSet::new();
        for url in sub_sitemaps {
            let pool = pool.clone();
            tasks.spawn(async move {
                let fetch_started = Instant::now();
                let result = pool.fetch(&url).await;
                (url, result, fetch_started.elapsed().as_millis() as u64)
            });
        }

        let mut fetched = 0usize;
        let mut failed = 0usize;

        // Completion order, not submission order.
        while let Some(joined) = tasks.join_next().await {
            let Ok((url, result, duration_ms)) = joined else {
                failed += 1;
                continue;
            };
            match result {
                Ok(content) => {
                    let parsed = sitemap::parse(&content);
                    let found = parsed.urls.len();
                    let new = match &self.config.filter {
                        Some(filter) => urls.extend(
                            parsed.urls.into_iter().filter(|u| filter.is_match(u)),
                        ),
                        None => urls.extend(parsed.urls),
                    };
                    fetched += 1;
                    self.audit_fetch("sitemap", Some(&url), duration_ms, "ok", Some(found));
                    self.emit(HarvestEvent::SitemapDone {
                        url,
                        found,
                        new,
                        error: None,
                    });
                }
                Err(e) => {
                    // Per-URL failure contributes nothing; the run continues.
                    warn!("sub-sitemap {url} failed: {e}");
                    failed += 1;
                    self.audit_fetch("sitemap", Some(&url), duration_ms, "error", None);
                    self.emit(HarvestEvent::SitemapDone {
                        url,
                        found: 0,
                        new: 0,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        let output_path = self.config.resolved_output_path();
        self.emit(HarvestEvent::Status(format!(
            "writing {} unique URLs to {}",
            urls.len(),
            output_path.display()
        )));

        let write_started = Instant::now();
        let sorted = urls.sorted();
        writer::write_sorted(&output_path, &sorted)?;
        self.audit_fetch(
            "write",
            None,
            write_started.elapsed().as_millis() as u64,
            "ok",
            Some(sorted.len()),
        );

        Ok(HarvestReport {
            sub_sitemaps: total,
            fetched,
            failed,
            unique_urls: sorted.len(),
            output_path,
            elapsed_secs: started.elapsed().as_secs_f64(),
        })
    }
}
