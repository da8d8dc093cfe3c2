//! The async directory engine.
//!
//! [`DirectoryEngine`] is the single writer of directory state. Every
//! mutation takes one short `parking_lot` lock, runs [`handle_command`],
//! publishes a fresh [`DirectorySnapshot`] on a `watch` channel and hands any
//! store writes to the background worker before releasing the lock. The lock
//! is never held across an `.await`; fetches, store reads and the merge all
//! happen outside it.
//!
//! Publishing before dispatching means a snapshot containing a toggled flag
//! is always visible before the matching store write starts. Dispatching
//! inside the lock means two toggles of the same entry reach the worker in
//! the order they were applied.

use super::collection::Collection;
use super::handler::{handle_command, Action, Command};
use super::snapshot::DirectorySnapshot;
use super::state::DirectoryState;
use crate::catalog::SharedCatalogFetcher;
use crate::domain::error::{DirectoryError, Result};
use crate::domain::{EntryId, ErrorKind};
use crate::storage::SharedFavoriteStore;
use crate::worker::{StoreEvent, StoreEventQueue, WorkerHandle, WorkerMessage};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::Instrument;

/// Result of a successful [`DirectoryEngine::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The fetched catalog was installed.
    Applied { entries: usize },
    /// A newer load had already been installed; this result was discarded.
    Superseded,
}

/// Owner of the canonical collection and query parameters.
pub struct DirectoryEngine {
    state: Mutex<DirectoryState>,
    fetcher: SharedCatalogFetcher,
    store: SharedFavoriteStore,
    publisher: watch::Sender<Arc<DirectorySnapshot>>,
    writer: WorkerHandle,
    events: Arc<StoreEventQueue>,
}

impl DirectoryEngine {
    /// Creates an empty engine and starts its write worker.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn new(fetcher: SharedCatalogFetcher, store: SharedFavoriteStore) -> Self {
        Self::with_event_queue(fetcher, store, StoreEventQueue::default())
    }

    /// Like [`new`](Self::new), but store events go to `events`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn with_event_queue(
        fetcher: SharedCatalogFetcher,
        store: SharedFavoriteStore,
        events: StoreEventQueue,
    ) -> Self {
        let events = Arc::new(events);
        let writer = WorkerHandle::spawn(Arc::clone(&store), Arc::clone(&events));

        let mut state = DirectoryState::new();
        let (publisher, _) = watch::channel(Arc::new(state.snapshot()));

        Self {
            state: Mutex::new(state),
            fetcher,
            store,
            publisher,
            writer,
            events,
        }
    }

    /// Runs one command under the lock, publishes, dispatches, and reads a
    /// value from the resulting state.
    fn execute<R>(&self, command: Command, read: impl FnOnce(&DirectoryState) -> R) -> Result<R> {
        let mut state = self.state.lock();
        let (publish, actions) = handle_command(&mut state, command)?;

        if publish {
            self.publisher.send_replace(Arc::new(state.snapshot()));
        }
        for action in actions {
            self.dispatch(action);
        }

        Ok(read(&state))
    }

    fn dispatch(&self, action: Action) {
        let (id, favorite, message) = match action {
            Action::PersistFavorite(entry) => (entry.id, true, WorkerMessage::upsert(entry)),
            Action::RemoveFavorite(id) => (id, false, WorkerMessage::delete(id)),
        };

        if let Err(e) = self.writer.send(message) {
            tracing::error!(id = %id, error = %e, "failed to dispatch favorite write");
            self.events.push(StoreEvent::WriteFailed {
                id,
                favorite,
                reason: e.to_string(),
            });
        }
    }

    /// Fetches the catalog and favorites, merges them and installs the result.
    ///
    /// Query parameters are reset to their defaults when the result is
    /// installed. A failing favorite store does not fail the load: the
    /// catalog is installed without favorites and a
    /// [`StoreEvent::Unavailable`] is reported.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::FetchFailed`] if the catalog could not be
    /// fetched. The previously installed collection stays in place.
    pub async fn load(&self) -> Result<LoadOutcome> {
        let ticket = self.execute(Command::LoadStarted, DirectoryState::last_ticket)?;
        let span = tracing::info_span!("load", ticket);

        async {
            let collection = match self.fetch_and_merge().await {
                Ok(collection) => collection,
                Err(e) => {
                    tracing::warn!(error = %e, "catalog load failed");
                    self.execute(
                        Command::LoadFailed {
                            ticket,
                            kind: ErrorKind::FetchFailed,
                        },
                        |_| (),
                    )?;
                    return Err(e);
                }
            };

            let entries = collection.len();
            let applied = self.execute(Command::LoadCompleted { ticket, collection }, |state| {
                state.applied_ticket() == ticket
            })?;

            if applied {
                Ok(LoadOutcome::Applied { entries })
            } else {
                Ok(LoadOutcome::Superseded)
            }
        }
        .instrument(span)
        .await
    }

    async fn fetch_and_merge(&self) -> Result<Collection> {
        let (favorites, raw) =
            futures_util::future::join(self.store.load_all(), self.fetcher.fetch_all()).await;

        let favorites = favorites.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "favorite store unavailable, loading without favorites");
            self.events.push(StoreEvent::Unavailable {
                reason: e.to_string(),
            });
            HashSet::new()
        });
        let raw = raw?;

        tracing::debug!(raw = raw.len(), favorites = favorites.len(), "catalog fetched");

        let span = tracing::Span::current();
        tokio::task::spawn_blocking(move || span.in_scope(|| Collection::merge(raw, &favorites)))
            .await
            .map_err(|e| DirectoryError::FetchFailed(format!("merge task failed: {e}")))
    }

    /// Sets the case-insensitive name prefix filter.
    ///
    /// # Errors
    ///
    /// Never fails today; returns `Result` for uniformity with other commands.
    pub fn set_search_prefix(&self, prefix: &str) -> Result<()> {
        self.execute(Command::SetSearchPrefix(prefix.to_string()), |_| ())
    }

    /// Enables or disables the favorite-only filter.
    ///
    /// # Errors
    ///
    /// Never fails today; returns `Result` for uniformity with other commands.
    pub fn set_favorite_only(&self, favorite_only: bool) -> Result<()> {
        self.execute(Command::SetFavoriteOnly(favorite_only), |_| ())
    }

    /// Flips an entry's favorite flag and queues the matching store write.
    ///
    /// Returns the new flag. The flag is visible in the published snapshot
    /// before this returns; the write completes later and its outcome
    /// arrives through [`take_store_events`](Self::take_store_events).
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::EntryNotFound`] if `id` is not in the
    /// canonical collection.
    pub fn toggle_favorite(&self, id: EntryId) -> Result<bool> {
        self.execute(Command::ToggleFavorite(id), |state| {
            state.entry(id).is_some_and(|entry| entry.is_favorite)
        })
    }

    /// Highlights an entry of the current view.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::EntryNotFound`] if `id` is not visible.
    pub fn select(&self, id: EntryId) -> Result<()> {
        self.execute(Command::Select(id), |_| ())
    }

    /// Re-queues the store write matching the entry's current flag.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::EntryNotFound`] if `id` is not in the
    /// canonical collection.
    pub fn retry_favorite(&self, id: EntryId) -> Result<()> {
        self.execute(Command::RetryFavorite(id), |_| ())
    }

    /// The most recently published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<DirectorySnapshot> {
        self.publisher.borrow().clone()
    }

    /// Receiver notified on every publication.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<DirectorySnapshot>> {
        self.publisher.subscribe()
    }

    /// Drains store events reported since the last call, oldest first.
    ///
    /// Callers that care about write outcomes should call this regularly.
    /// Events are buffered up to the queue's capacity
    /// ([`DEFAULT_EVENT_CAPACITY`](crate::worker::DEFAULT_EVENT_CAPACITY)
    /// unless built with [`with_event_queue`](Self::with_event_queue)); past
    /// that the oldest are dropped with a warning.
    #[must_use]
    pub fn take_store_events(&self) -> Vec<StoreEvent> {
        self.events.drain()
    }

    /// Store writes queued or in progress.
    #[must_use]
    pub fn pending_writes(&self) -> usize {
        self.writer.pending()
    }

    /// Waits for every store write queued so far to finish.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Worker`] if the write worker has stopped.
    pub async fn flush(&self) -> Result<()> {
        self.writer.flush().await
    }
}

impl std::fmt::Debug for DirectoryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("DirectoryEngine")
            .field("generation", &snapshot.generation)
            .field("total", &snapshot.total)
            .field("pending_writes", &self.pending_writes())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::domain::RawEntry;
    use crate::engine::LoadStatus;
    use crate::storage::MemoryFavoriteStore;

    fn engine_with(entries: Vec<RawEntry>) -> (DirectoryEngine, Arc<StaticCatalog>, Arc<MemoryFavoriteStore>) {
        let catalog = Arc::new(StaticCatalog::new(entries));
        let store = Arc::new(MemoryFavoriteStore::new());
        let engine = DirectoryEngine::new(catalog.clone(), store.clone());
        (engine, catalog, store)
    }

    #[tokio::test]
    async fn starts_idle_and_loads() {
        let (engine, _, _) = engine_with(vec![
            RawEntry::new(2, "Paris", "FR", 48.8566, 2.3522),
            RawEntry::new(1, "Buenos Aires", "AR", -34.6037, -58.3816),
        ]);
        assert_eq!(engine.snapshot().status(), LoadStatus::Idle);

        let outcome = engine.load().await.unwrap();
        assert_eq!(outcome, LoadOutcome::Applied { entries: 2 });

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.status(), LoadStatus::Loaded(2));
        assert_eq!(snapshot.result_names(), vec!["Buenos Aires", "Paris"]);
    }

    #[tokio::test]
    async fn toggle_publishes_before_write_completes() {
        let (engine, _, store) = engine_with(vec![RawEntry::new(2, "Paris", "FR", 48.8566, 2.3522)]);
        engine.load().await.unwrap();
        store.set_write_delay(Some(std::time::Duration::from_millis(50)));

        assert!(engine.toggle_favorite(EntryId(2)).unwrap());
        assert!(engine.snapshot().results[0].is_favorite);
        assert!(!store.contains(EntryId(2)));

        engine.flush().await.unwrap();
        assert!(store.contains(EntryId(2)));
        assert_eq!(engine.take_store_events(), vec![StoreEvent::Saved { id: EntryId(2) }]);
    }

    #[tokio::test]
    async fn unknown_toggle_does_not_publish() {
        let (engine, _, store) = engine_with(vec![RawEntry::new(2, "Paris", "FR", 48.8566, 2.3522)]);
        engine.load().await.unwrap();
        let generation = engine.snapshot().generation;

        assert!(matches!(
            engine.toggle_favorite(EntryId(7)),
            Err(DirectoryError::EntryNotFound(EntryId(7)))
        ));
        assert_eq!(engine.snapshot().generation, generation);
        engine.flush().await.unwrap();
        assert!(store.operations().is_empty());
    }

    #[tokio::test]
    async fn undrained_store_events_stay_bounded() {
        let catalog = Arc::new(StaticCatalog::new(vec![RawEntry::new(2, "Paris", "FR", 48.8566, 2.3522)]));
        let store = Arc::new(MemoryFavoriteStore::new());
        let engine = DirectoryEngine::with_event_queue(catalog, store, StoreEventQueue::with_capacity(4));
        engine.load().await.unwrap();

        for _ in 0..10 {
            engine.toggle_favorite(EntryId(2)).unwrap();
        }
        engine.flush().await.unwrap();

        let events = engine.take_store_events();
        assert_eq!(events.len(), 4);
        assert_eq!(events.last(), Some(&StoreEvent::Removed { id: EntryId(2) }));
        assert!(engine.take_store_events().is_empty());
    }
}
