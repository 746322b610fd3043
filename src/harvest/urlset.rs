//! Shared deduplicated URL accumulator.

use dashmap::DashSet;
use rayon::prelude::*;

/// Concurrent set of harvested URLs.
///
/// Workers insert from many tasks at once; [`UrlSet::sorted`] snapshots
/// and sorts for the final write.
#[derive(Debug, Default)]
pub struct UrlSet {
    urls: DashSet<String>,
}

impl UrlSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one URL. Returns true if it was not already present.
    pub fn insert(&self, url: String) -> bool {
        self.urls.insert(url)
    }

    /// Insert many URLs, returning how many were newly inserted.
    pub fn extend<I: IntoIterator<Item = String>>(&self, urls: I) -> usize {
        urls.into_iter().map(|u| self.urls.insert(u)).filter(|new| *new).count()
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Snapshot the set as a lexicographically sorted vector.
    pub fn sorted(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.urls.iter().map(|u| u.key().clone()).collect();
        urls.par_sort_unstable();
        urls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extend_counts_only_new() {
        let set = UrlSet::new();
        let first = set.extend(vec![
            "https://example.com/a".to_string(),
            "https://example.com/b".to_string(),
        ]);
        assert_eq!(first, 2);

        let second = set.extend(vec![
            "https://example.com/b".to_string(),
            "https://example.com/c".to_string(),
        ]);
        assert_eq!(second, 1);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_sorted_is_lexicographic() {
        let set = UrlSet::new();
        set.insert("https://example.com/z".to_string());
        set.insert("https://example.com/a".to_string());
        set.insert("https://example.com/m".to_string());

        assert_eq!(
            set.sorted(),
            vec![
                "https://example.com/a",
                "https://example.com/m",
                "https://example.com/z"
            ]
        );
    }

    #[test]
    fn test_concurrent_inserts_dedup() {
        use std::sync::Arc;
        use std::thread;

        let set = Arc::new(UrlSet::new());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let set = set.clone();
            handles.push(thread::spawn(move || {
                for i in 0..100 {
                    set.insert(format!("https://example.com/part/{i}"));
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(set.len(), 100);
    }
}
