//! In-process favorite store.
//!
//! Keeps favorites in a map guarded by a `parking_lot` mutex. Useful when no
//! durable storage is wanted (ephemeral sessions) and as a store whose every
//! operation can be observed and made to fail on demand.

use crate::domain::error::{DirectoryError, Result};
use crate::domain::{Entry, EntryId};
use crate::storage::backend::FavoriteStore;
use crate::storage::models::FavoriteRecord;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// One mutation observed at the store boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Upsert(EntryId),
    Delete(EntryId),
}

/// Map-backed [`FavoriteStore`].
#[derive(Debug, Default)]
pub struct MemoryFavoriteStore {
    favorites: Mutex<BTreeMap<EntryId, FavoriteRecord>>,
    log: Mutex<Vec<StoreOp>>,
    unavailable: AtomicBool,
    fail_writes: AtomicBool,
    write_delay: Mutex<Option<Duration>>,
}

impl MemoryFavoriteStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with favorites.
    #[must_use]
    pub fn with_favorites<'a>(entries: impl IntoIterator<Item = &'a Entry>) -> Self {
        let favorites = entries
            .into_iter()
            .map(|entry| (entry.id, FavoriteRecord::from_entry(entry)))
            .collect();
        Self {
            favorites: Mutex::new(favorites),
            ..Self::default()
        }
    }

    /// Makes `load_all` fail with `StoreUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Makes every subsequent upsert/delete fail with `StoreWriteFailed`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Delays every write, simulating a slow disk.
    pub fn set_write_delay(&self, delay: Option<Duration>) {
        *self.write_delay.lock() = delay;
    }

    /// Currently persisted favorite keys.
    #[must_use]
    pub fn keys(&self) -> HashSet<EntryId> {
        self.favorites.lock().keys().copied().collect()
    }

    #[must_use]
    pub fn contains(&self, id: EntryId) -> bool {
        self.favorites.lock().contains_key(&id)
    }

    /// Every successful mutation, in the order it was applied.
    #[must_use]
    pub fn operations(&self) -> Vec<StoreOp> {
        self.log.lock().clone()
    }

    async fn before_write(&self, id: EntryId) -> Result<()> {
        let delay = *self.write_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DirectoryError::StoreWriteFailed {
                id,
                reason: "memory store rejected write".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl FavoriteStore for MemoryFavoriteStore {
    async fn load_all(&self) -> Result<HashSet<EntryId>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DirectoryError::StoreUnavailable(
                "memory store marked unavailable".to_string(),
            ));
        }
        Ok(self.keys())
    }

    async fn upsert(&self, entry: &Entry) -> Result<()> {
        self.before_write(entry.id).await?;
        self.favorites
            .lock()
            .insert(entry.id, FavoriteRecord::from_entry(entry));
        self.log.lock().push(StoreOp::Upsert(entry.id));
        Ok(())
    }

    async fn delete(&self, id: EntryId) -> Result<()> {
        self.before_write(id).await?;
        self.favorites.lock().remove(&id);
        self.log.lock().push(StoreOp::Delete(id));
        Ok(())
    }
}
