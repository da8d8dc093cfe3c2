//! JSON file-based favorite store.
//!
//! A simple, human-readable backend. Every mutation rewrites the whole file
//! using an atomic write (write-to-temp + rename) so a crash never leaves a
//! half-written favorites file behind.
//!
//! # Performance Characteristics
//!
//! - **Read**: the file is parsed once, on first use
//! - **Write**: O(n), serializes the whole favorite set
//! - **Best for**: hundreds of favorites, writes driven by user clicks

use crate::domain::error::{DirectoryError, Result};
use crate::domain::{Entry, EntryId};
use crate::storage::backend::FavoriteStore;
use crate::storage::models::FavoriteRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::Instrument;

/// Current on-disk format version.
const FORMAT_VERSION: u32 = 1;

/// JSON storage container format.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StorageData {
    /// Version of the storage format for future migrations.
    version: u32,

    /// Favorites keyed by entry id.
    #[serde(default)]
    favorites: BTreeMap<EntryId, FavoriteRecord>,
}

impl Default for StorageData {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            favorites: BTreeMap::new(),
        }
    }
}

/// JSON file favorite store.
///
/// The file is opened lazily: [`FavoriteStore::load_all`] (or the first
/// write) reads it into memory, after which the in-memory copy is
/// authoritative and every change is persisted before the call returns.
///
/// # File Format
///
/// ```json
/// {
///   "version": 1,
///   "favorites": {
///     "3435910": {
///       "id": 3435910,
///       "name": "Buenos Aires",
///       "country": "AR",
///       "coordinates": { "latitude": -34.61, "longitude": -58.38 },
///       "favorited_at": "2025-01-05T12:00:00Z"
///     }
///   }
/// }
/// ```
#[derive(Debug)]
pub struct JsonFavoriteStore {
    /// Path to the JSON file on disk.
    file_path: PathBuf,

    /// In-memory copy, `None` until the file has been read.
    data: Mutex<Option<StorageData>>,
}

impl JsonFavoriteStore {
    /// Creates a store backed by `file_path`. No I/O happens until first use.
    #[must_use]
    pub fn new(file_path: PathBuf) -> Self {
        Self {
            file_path,
            data: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Reads the favorites file, treating a missing file as an empty store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    async fn load_from_file(path: &Path) -> Result<StorageData> {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = ?path, "favorites file absent, starting empty");
                return Ok(StorageData::default());
            }
            Err(e) => {
                return Err(DirectoryError::StoreUnavailable(format!(
                    "failed to read {}: {e}",
                    path.display()
                )))
            }
        };

        let data: StorageData = serde_json::from_str(&contents).map_err(|e| {
            DirectoryError::StoreUnavailable(format!("failed to parse {}: {e}", path.display()))
        })?;

        tracing::debug!(
            version = data.version,
            favorites = data.favorites.len(),
            "loaded favorites file"
        );

        Ok(data)
    }

    /// Writes the data to disk using write-to-temp + rename.
    async fn save_to_file(path: &Path, data: &StorageData) -> std::result::Result<(), String> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("failed to create {}: {e}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(data)
            .map_err(|e| format!("failed to serialize favorites: {e}"))?;

        let tmp_path = path.with_extension("tmp");

        tracing::trace!(tmp_path = ?tmp_path, "writing to temporary file");
        tokio::fs::write(&tmp_path, json)
            .await
            .map_err(|e| format!("failed to write {}: {e}", tmp_path.display()))?;

        tracing::trace!("renaming temporary file to final location");
        tokio::fs::rename(&tmp_path, path)
            .await
            .map_err(|e| format!("failed to replace {}: {e}", path.display()))?;

        Ok(())
    }

    /// Applies `mutate` to the loaded data and persists it if it reports a change.
    ///
    /// On a failed save the in-memory copy is rolled back so that it never
    /// claims more than the file holds.
    async fn mutate<F>(&self, id: EntryId, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut StorageData) -> bool + Send,
    {
        let write_failed = |reason: String| DirectoryError::StoreWriteFailed { id, reason };

        let mut guard = self.data.lock().await;
        if guard.is_none() {
            let loaded = Self::load_from_file(&self.file_path)
                .await
                .map_err(|e| write_failed(e.to_string()))?;
            *guard = Some(loaded);
        }
        let Some(data) = guard.as_mut() else {
            return Err(write_failed("store not initialized".to_string()));
        };

        let before = data.clone();
        let dirty = mutate(data);
        if !dirty {
            tracing::trace!("skipping save, no changes");
            return Ok(());
        }

        if let Err(reason) = Self::save_to_file(&self.file_path, data).await {
            *data = before;
            return Err(write_failed(reason));
        }

        tracing::debug!(favorites = data.favorites.len(), "favorites saved");
        Ok(())
    }
}

#[async_trait]
impl FavoriteStore for JsonFavoriteStore {
    async fn load_all(&self) -> Result<HashSet<EntryId>> {
        let span = tracing::debug_span!("json_load_all", path = ?self.file_path);
        async {
            let mut guard = self.data.lock().await;
            let data = Self::load_from_file(&self.file_path).await?;
            let keys: HashSet<EntryId> = data.favorites.keys().copied().collect();
            *guard = Some(data);

            tracing::debug!(count = keys.len(), "retrieved favorite keys");
            Ok(keys)
        }
        .instrument(span)
        .await
    }

    async fn upsert(&self, entry: &Entry) -> Result<()> {
        let span = tracing::debug_span!("json_upsert", id = %entry.id, name = %entry.name);
        let record = FavoriteRecord::from_entry(entry);
        self.mutate(entry.id, move |data| {
            data.favorites.insert(record.id, record);
            true
        })
        .instrument(span)
        .await
    }

    async fn delete(&self, id: EntryId) -> Result<()> {
        let span = tracing::debug_span!("json_delete", id = %id);
        self.mutate(id, move |data| data.favorites.remove(&id).is_some())
            .instrument(span)
            .await
    }
}
