//! JSON-file cache for scan results.

use anyhow::Result;
use chrono::{Duration, Utc};
use std::path::{Path, PathBuf};

use crate::competitors::ScanReport;

/// Caches the most recent scan report on disk so repeated pipeline runs
/// don't re-scrape competitors within the freshness window.
pub struct ScanCache {
    path: PathBuf,
    max_age: Duration,
}

impl ScanCache {
    /// Create a cache at the given path with a freshness window.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, max_age: Duration) -> Self {
        Self {
            path: path.into(),
            max_age,
        }
    }

    /// Load the cached report if it exists and is still fresh.
    #[must_use]
    pub fn load_fresh(&self) -> Option<ScanReport> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        let report: ScanReport = serde_json::from_str(&content).ok()?;

        let scanned_at = report.scanned_at?;
        if Utc::now() - scanned_at > self.max_age {
            tracing::debug!(path = %self.path.display(), "Scan cache is stale");
            return None;
        }
        Some(report)
    }

    /// Save a report, creating parent directories as needed.
    pub fn save(&self, report: &ScanReport) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(report)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    /// Path to the cache file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_save_and_load_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ScanCache::new(dir.path().join("scan.json"), Duration::hours(6));

        let report = ScanReport {
            scanned_at: Some(Utc::now()),
            sites_scanned: 2,
            ..Default::default()
        };
        cache.save(&report).unwrap();

        let loaded = cache.load_fresh().unwrap();
        assert_eq!(loaded.sites_scanned, 2);
    }

    #[test]
    fn test_stale_cache_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ScanCache::new(dir.path().join("scan.json"), Duration::hours(1));

        let report = ScanReport {
            scanned_at: Some(Utc::now() - Duration::hours(2)),
            sites_scanned: 1,
            ..Default::default()
        };
        cache.save(&report).unwrap();

        assert!(cache.load_fresh().is_none());
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ScanCache::new(dir.path().join("missing.json"), Duration::hours(1));
        assert!(cache.load_fresh().is_none());
    }
}
