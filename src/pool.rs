//! Bounded fetch pool.
//!
//! Caps the number of sitemap fetches in flight. The permit covers the
//! whole fetch, so at most `workers` pages exist at any moment.

use crate::browser::SitemapFetcher;
use crate::error::HarvestError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Fixed-size worker pool over a shared fetcher.
pub struct FetchPool {
    fetcher: Arc<dyn SitemapFetcher>,
    semaphore: Arc<Semaphore>,
    workers: usize,
    active_count: Arc<AtomicUsize>,
}

impl FetchPool {
    /// Create a pool with `workers` concurrent fetch slots.
    pub fn new(fetcher: Arc<dyn SitemapFetcher>, workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            fetcher,
            semaphore: Arc::new(Semaphore::new(workers)),
            workers,
            active_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fetch one URL, blocking until a worker slot is free.
    pub async fn fetch(&self, url: &str) -> Result<String, HarvestError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .expect("fetch pool semaphore closed");

        self.active_count.fetch_add(1, Ordering::SeqCst);
        let result = self.fetcher.fetch(url).await;
        self.active_count.fetch_sub(1, Ordering::SeqCst);
        result
    }

    /// Number of fetches currently in flight.
    pub fn active(&self) -> usize {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Maximum concurrent fetches.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Free worker slots.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Fetcher that records the highest number of concurrent calls.
    struct ConcurrencyProbe {
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl SitemapFetcher for ConcurrencyProbe {
        async fn fetch(&self, _url: &str) -> Result<String, HarvestError> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            Ok("<urlset></urlset>".to_string())
        }
    }

    #[tokio::test]
    async fn test_pool_bounds_concurrency() {
        let probe = Arc::new(ConcurrencyProbe {
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let pool = Arc::new(FetchPool::new(probe.clone(), 3));

        let mut handles = Vec::new();
        for i in 0..12 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                pool.fetch(&format!("https://example.com/{i}.xml")).await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }

        assert!(probe.peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(pool.active(), 0);
        assert_eq!(pool.available(), 3);
    }

    #[tokio::test]
    async fn test_workers_clamped_to_one() {
        struct Noop;
        #[async_trait]
        impl SitemapFetcher for Noop {
            async fn fetch(&self, _url: &str) -> Result<String, HarvestError> {
                Ok(String::new())
            }
        }
        let pool = FetchPool::new(Arc::new(Noop), 0);
        assert_eq!(pool.workers(), 1);
    }
}
