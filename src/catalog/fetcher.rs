//! Catalog fetcher abstraction.
//!
//! A [`CatalogFetcher`] returns the complete, unfiltered remote catalog in
//! whatever order the source delivers it. Sorting, validation and favorite
//! annotation are the engine's job.

use crate::domain::error::{DirectoryError, Result};
use crate::domain::RawEntry;
use async_trait::async_trait;
use std::sync::Arc;

/// Source of the full raw entry list.
#[async_trait]
pub trait CatalogFetcher: Send + Sync {
    /// Fetches every raw entry.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::FetchFailed`] for any transport, timeout or
    /// decoding failure.
    async fn fetch_all(&self) -> Result<Vec<RawEntry>>;
}

/// Shared handle to a catalog fetcher.
pub type SharedCatalogFetcher = Arc<dyn CatalogFetcher>;

/// Decodes a catalog payload (a JSON array of raw entries).
///
/// # Errors
///
/// Returns [`DirectoryError::FetchFailed`] when the payload is not a valid
/// catalog document.
///
/// # Examples
///
/// ```
/// use citydex::catalog::parse_catalog;
///
/// let raw = parse_catalog(br#"[{"country":"AR","name":"Rosario","_id":3838583,"coord":{"lon":-60.64,"lat":-32.94}}]"#)?;
/// assert_eq!(raw.len(), 1);
/// # Ok::<(), citydex::DirectoryError>(())
/// ```
pub fn parse_catalog(bytes: &[u8]) -> Result<Vec<RawEntry>> {
    serde_json::from_slice(bytes)
        .map_err(|e| DirectoryError::FetchFailed(format!("malformed catalog payload: {e}")))
}
