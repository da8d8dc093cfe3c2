//! Local catalog sources: a JSON file on disk and an in-memory list.

use crate::catalog::fetcher::{parse_catalog, CatalogFetcher};
use crate::domain::error::{DirectoryError, Result};
use crate::domain::RawEntry;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::time::Duration;

/// Reads the catalog from a JSON file with the same shape as the remote payload.
#[derive(Debug, Clone)]
pub struct FileCatalogFetcher {
    path: PathBuf,
}

impl FileCatalogFetcher {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl CatalogFetcher for FileCatalogFetcher {
    async fn fetch_all(&self) -> Result<Vec<RawEntry>> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            DirectoryError::FetchFailed(format!("failed to read {}: {e}", self.path.display()))
        })?;
        tracing::debug!(path = ?self.path, bytes = bytes.len(), "catalog file read");
        parse_catalog(&bytes)
    }
}

/// In-memory catalog whose contents, latency and failure can be changed at runtime.
#[derive(Debug, Default)]
pub struct StaticCatalog {
    entries: Mutex<Vec<RawEntry>>,
    delay: Mutex<Option<Duration>>,
    failure: Mutex<Option<String>>,
}

impl StaticCatalog {
    #[must_use]
    pub fn new(entries: Vec<RawEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
            ..Self::default()
        }
    }

    /// Replaces the entries returned by later fetches.
    pub fn set_entries(&self, entries: Vec<RawEntry>) {
        *self.entries.lock() = entries;
    }

    /// Delays every later fetch by `delay`.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock() = delay;
    }

    /// Makes later fetches fail with `FetchFailed(reason)`.
    pub fn set_failure(&self, reason: Option<String>) {
        *self.failure.lock() = reason;
    }
}

#[async_trait]
impl CatalogFetcher for StaticCatalog {
    async fn fetch_all(&self) -> Result<Vec<RawEntry>> {
        // Snapshot before sleeping so a fetch returns what was configured when it started.
        let entries = self.entries.lock().clone();
        let failure = self.failure.lock().clone();
        let delay = *self.delay.lock();

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match failure {
            Some(reason) => Err(DirectoryError::FetchFailed(reason)),
            None => Ok(entries),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_fetcher_reads_catalog_and_reports_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("cities.json");
        std::fs::write(
            &good,
            r#"[{"country":"FR","name":"Paris","_id":2988507,"coord":{"lon":2.35,"lat":48.85}}]"#,
        )
        .unwrap();
        let entries = FileCatalogFetcher::new(good).fetch_all().await.unwrap();
        assert_eq!(entries[0].name, "Paris");

        let bad = dir.path().join("broken.json");
        std::fs::write(&bad, "[{").unwrap();
        let err = FileCatalogFetcher::new(bad).fetch_all().await.unwrap_err();
        assert!(matches!(err, DirectoryError::FetchFailed(_)));

        let missing = FileCatalogFetcher::new(dir.path().join("missing.json"));
        assert!(matches!(missing.fetch_all().await, Err(DirectoryError::FetchFailed(_))));
    }

    #[tokio::test]
    async fn static_catalog_can_fail() {
        let catalog = StaticCatalog::new(vec![RawEntry::new(1, "Lima", "PE", -12.0, -77.0)]);
        assert_eq!(catalog.fetch_all().await.unwrap().len(), 1);

        catalog.set_failure(Some("offline".to_string()));
        assert!(matches!(catalog.fetch_all().await, Err(DirectoryError::FetchFailed(_))));
    }
}
