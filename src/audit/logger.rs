//! JSONL audit logger — append-only log of every fetch.

use crate::browser::launcher::lochound_home;
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// One audit record: a fetch, a parse result, or the final write.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub timestamp: String,
    pub run_id: String,
    /// "index", "sitemap", or "write".
    pub phase: String,
    pub url: Option<String>,
    pub duration_ms: u64,
    pub status: String,
    /// URLs contributed by this phase, when applicable.
    pub url_count: Option<usize>,
}

/// Append-only JSONL audit logger. One run id per logger instance.
pub struct AuditLogger {
    file: File,
    run_id: String,
}

impl AuditLogger {
    /// Open or create the audit log file.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open audit log: {}", path.display()))?;

        Ok(Self {
            file,
            run_id: Uuid::new_v4().to_string(),
        })
    }

    /// Default audit log location: ~/.lochound/harvest.jsonl.
    pub fn default_path() -> PathBuf {
        lochound_home().join("harvest.jsonl")
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Append one record.
    pub fn log(&mut self, record: &AuditRecord) -> Result<()> {
        let json = serde_json::to_string(record)?;
        writeln!(self.file, "{json}")?;
        Ok(())
    }

    /// Append a fetch record with timing.
    pub fn log_fetch(
        &mut self,
        phase: &str,
        url: Option<&str>,
        duration_ms: u64,
        status: &str,
        url_count: Option<usize>,
    ) -> Result<()> {
        let record = AuditRecord {
            timestamp: Utc::now().to_rfc3339(),
            run_id: self.run_id.clone(),
            phase: phase.to_string(),
            url: url.map(String::from),
            duration_ms,
            status: status.to_string(),
            url_count,
        };
        self.log(&record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_include;

    #[test]
    fn test_log_fetch_appends_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harvest.jsonl");

        let mut logger = AuditLogger::open(&path).unwrap();
        logger
            .log_fetch(
                "sitemap",
                Some("https://example.com/s1.xml"),
                1200,
                "ok",
                Some(5000),
            )
            .unwrap();
        logger
            .log_fetch("sitemap", Some("https://example.com/s2.xml"), 800, "error", None)
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_json_include!(
            actual: first,
            expected: serde_json::json!({
                "phase": "sitemap",
                "url": "https://example.com/s1.xml",
                "duration_ms": 1200,
                "status": "ok",
                "url_count": 5000,
            })
        );

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["run_id"], first["run_id"]);
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/audit/harvest.jsonl");
        let mut logger = AuditLogger::open(&path).unwrap();
        logger.log_fetch("write", None, 3, "ok", Some(0)).unwrap();
        assert!(path.exists());
    }
}
