//! Favorite store abstraction.
//!
//! This module defines the [`FavoriteStore`] trait that abstracts over the
//! durable favorite backends. The engine reads every key once per load and
//! upserts or deletes a single entry per toggle.

use crate::domain::error::Result;
use crate::domain::{Entry, EntryId};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

/// Durable keyed storage for favorite flags.
///
/// # Implementations
///
/// - [`JsonFavoriteStore`](crate::storage::JsonFavoriteStore): JSON file with atomic writes (default)
/// - [`MemoryFavoriteStore`](crate::storage::MemoryFavoriteStore): in-process map
///
/// # Examples
///
/// ```no_run
/// use citydex::storage::{FavoriteStore, JsonFavoriteStore};
/// use std::path::PathBuf;
///
/// # async fn run() -> citydex::Result<()> {
/// let store = JsonFavoriteStore::new(PathBuf::from("/tmp/favorites.json"));
/// let favorites = store.load_all().await?;
/// println!("{} favorites", favorites.len());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait FavoriteStore: Send + Sync {
    /// Returns the key of every persisted favorite.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::StoreUnavailable`](crate::DirectoryError::StoreUnavailable)
    /// if the backing store cannot be opened or read.
    async fn load_all(&self) -> Result<HashSet<EntryId>>;

    /// Inserts or replaces the favorite record for `entry.id`.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::StoreWriteFailed`](crate::DirectoryError::StoreWriteFailed)
    /// if the write cannot be made durable.
    async fn upsert(&self, entry: &Entry) -> Result<()>;

    /// Removes the favorite record for `id`. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::StoreWriteFailed`](crate::DirectoryError::StoreWriteFailed)
    /// if the removal cannot be made durable.
    async fn delete(&self, id: EntryId) -> Result<()>;
}

/// Shared handle to a favorite store.
pub type SharedFavoriteStore = Arc<dyn FavoriteStore>;
