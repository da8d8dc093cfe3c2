//! Background worker for durable favorite writes.
//!
//! All store writes run on one tokio task fed by an unbounded FIFO channel.
//! A single consumer means writes reach the store in exactly the order the
//! engine issued them, so at most one write per entry (and in total) is ever
//! outstanding, and a later toggle can never be overtaken by an earlier one.

use crate::domain::error::{DirectoryError, Result};
use crate::domain::EntryId;
use crate::storage::SharedFavoriteStore;
use crate::worker::{StoreEvent, StoreEventQueue, WorkerMessage};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::Instrument;

/// Consumer side of the write queue.
///
/// Owns the store handle and pushes every outcome onto the event queue.
pub struct FavoriteWorker {
    store: SharedFavoriteStore,
    events: Arc<StoreEventQueue>,
    pending: Arc<AtomicUsize>,
}

impl FavoriteWorker {
    /// Processes messages until every [`WorkerHandle`] has been dropped.
    pub async fn run(self, mut receiver: mpsc::UnboundedReceiver<WorkerMessage>) {
        tracing::debug!("favorite worker started");
        while let Some(message) = receiver.recv().await {
            self.handle_message(message).await;
        }
        tracing::debug!("favorite worker stopped");
    }

    /// Helper for handling store results with consistent logging.
    ///
    /// Maps a write outcome onto the event reported to the engine.
    fn handle_store_result<F>(operation: &str, id: EntryId, favorite: bool, result: Result<()>, on_success: F) -> StoreEvent
    where
        F: FnOnce() -> StoreEvent,
    {
        match result {
            Ok(()) => {
                tracing::debug!(operation = operation, id = %id, "store operation successful");
                on_success()
            }
            Err(e) => {
                tracing::warn!(operation = operation, id = %id, error = %e, "store operation failed");
                let reason = match e {
                    DirectoryError::StoreWriteFailed { reason, .. } => reason,
                    other => other.to_string(),
                };
                StoreEvent::WriteFailed { id, favorite, reason }
            }
        }
    }

    /// Handles one message; store writes report an event, flushes are acked.
    pub async fn handle_message(&self, message: WorkerMessage) {
        let span = tracing::debug_span!(parent: message.origin(), "worker_handle_message", message_type = message.kind());

        async {
            let event = match message {
                WorkerMessage::Upsert { entry, .. } => {
                    let id = entry.id;
                    let result = self.store.upsert(&entry).await;
                    Some(Self::handle_store_result("upsert favorite", id, true, result, || {
                        StoreEvent::Saved { id }
                    }))
                }
                WorkerMessage::Delete { id, .. } => {
                    let result = self.store.delete(id).await;
                    Some(Self::handle_store_result("delete favorite", id, false, result, || {
                        StoreEvent::Removed { id }
                    }))
                }
                WorkerMessage::Flush { ack, .. } => {
                    // Receiver may have given up waiting.
                    let _ = ack.send(());
                    None
                }
            };

            if let Some(event) = event {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                self.events.push(event);
            }
        }
        .instrument(span)
        .await;
    }
}

/// Producer side of the write queue, held by the engine.
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    sender: mpsc::UnboundedSender<WorkerMessage>,
    pending: Arc<AtomicUsize>,
}

impl WorkerHandle {
    /// Spawns a [`FavoriteWorker`] on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn spawn(store: SharedFavoriteStore, events: Arc<StoreEventQueue>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));

        let worker = FavoriteWorker {
            store,
            events,
            pending: Arc::clone(&pending),
        };
        tokio::spawn(worker.run(receiver));

        Self { sender, pending }
    }

    /// Enqueues a message. Never blocks.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Worker`] if the worker task has stopped.
    pub fn send(&self, message: WorkerMessage) -> Result<()> {
        let is_write = !matches!(message, WorkerMessage::Flush { .. });
        if is_write {
            self.pending.fetch_add(1, Ordering::SeqCst);
        }

        self.sender.send(message).map_err(|e| {
            if is_write {
                self.pending.fetch_sub(1, Ordering::SeqCst);
            }
            DirectoryError::Worker(format!("favorite worker stopped: {e}"))
        })
    }

    /// Writes queued or in progress.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Waits until every write enqueued before this call has completed.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Worker`] if the worker task has stopped.
    pub async fn flush(&self) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.send(WorkerMessage::flush(ack))?;
        done.await
            .map_err(|_| DirectoryError::Worker("favorite worker dropped flush".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coordinates, Entry};
    use crate::storage::{MemoryFavoriteStore, StoreOp};
    use std::time::Duration;

    fn paris() -> Entry {
        Entry::new(EntryId(3), "Paris", "FR", Coordinates::new(48.8566, 2.3522)).with_favorite(true)
    }

    #[tokio::test]
    async fn writes_are_applied_in_send_order() {
        let store = Arc::new(MemoryFavoriteStore::new());
        store.set_write_delay(Some(Duration::from_millis(5)));
        let events = Arc::new(StoreEventQueue::default());
        let handle = WorkerHandle::spawn(store.clone(), Arc::clone(&events));

        handle.send(WorkerMessage::upsert(paris())).unwrap();
        handle.send(WorkerMessage::delete(EntryId(3))).unwrap();
        handle.send(WorkerMessage::upsert(paris())).unwrap();
        assert_eq!(handle.pending(), 3);

        handle.flush().await.unwrap();
        assert_eq!(handle.pending(), 0);
        assert_eq!(
            store.operations(),
            vec![StoreOp::Upsert(EntryId(3)), StoreOp::Delete(EntryId(3)), StoreOp::Upsert(EntryId(3))]
        );
        assert!(store.contains(EntryId(3)));

        assert_eq!(
            events.drain(),
            vec![
                StoreEvent::Saved { id: EntryId(3) },
                StoreEvent::Removed { id: EntryId(3) },
                StoreEvent::Saved { id: EntryId(3) },
            ]
        );
    }

    #[tokio::test]
    async fn failures_are_reported_with_intended_flag() {
        let store = Arc::new(MemoryFavoriteStore::new());
        store.set_fail_writes(true);
        let events = Arc::new(StoreEventQueue::default());
        let handle = WorkerHandle::spawn(store.clone(), Arc::clone(&events));

        handle.send(WorkerMessage::upsert(paris())).unwrap();
        handle.flush().await.unwrap();

        match events.drain().as_slice() {
            [StoreEvent::WriteFailed { id, favorite, .. }] => {
                assert_eq!(*id, EntryId(3));
                assert!(*favorite);
            }
            other => panic!("unexpected events: {other:?}"),
        }
        assert!(!store.contains(EntryId(3)));
        assert_eq!(handle.pending(), 0);
    }

    #[tokio::test]
    async fn undrained_outcomes_are_capped() {
        let store = Arc::new(MemoryFavoriteStore::new());
        let events = Arc::new(StoreEventQueue::with_capacity(2));
        let handle = WorkerHandle::spawn(store.clone(), Arc::clone(&events));

        for _ in 0..3 {
            handle.send(WorkerMessage::upsert(paris())).unwrap();
            handle.send(WorkerMessage::delete(EntryId(3))).unwrap();
        }
        handle.flush().await.unwrap();

        assert_eq!(store.operations().len(), 6);
        assert_eq!(
            events.drain(),
            vec![StoreEvent::Saved { id: EntryId(3) }, StoreEvent::Removed { id: EntryId(3) }]
        );
    }
}
