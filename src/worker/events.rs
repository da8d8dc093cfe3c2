//! Store outcomes reported back to the engine's caller.
//!
//! Events collect in a [`StoreEventQueue`] until someone calls
//! [`DirectoryEngine::take_store_events`](crate::engine::DirectoryEngine::take_store_events).
//! The queue is bounded: a caller that only watches snapshots and never
//! drains it loses the oldest events instead of growing memory without
//! limit.

use crate::domain::EntryId;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Events kept when nobody drains the queue.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Outcomes of favorite store operations, reported on a side channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// The favorite was written.
    Saved { id: EntryId },

    /// The favorite key was deleted.
    Removed { id: EntryId },

    /// A write failed. The in-memory flag keeps `favorite`; the store does not.
    WriteFailed {
        id: EntryId,
        favorite: bool,
        reason: String,
    },

    /// The store could not be read during a load; the catalog was installed
    /// with no favorites.
    Unavailable { reason: String },
}

impl StoreEvent {
    /// Entry the event refers to, if any.
    #[must_use]
    pub const fn id(&self) -> Option<EntryId> {
        match self {
            Self::Saved { id } | Self::Removed { id } | Self::WriteFailed { id, .. } => Some(*id),
            Self::Unavailable { .. } => None,
        }
    }
}

#[derive(Debug, Default)]
struct QueueInner {
    events: VecDeque<StoreEvent>,
    dropped: usize,
}

/// Bounded FIFO of [`StoreEvent`]s shared by the worker and the engine.
#[derive(Debug)]
pub struct StoreEventQueue {
    inner: Mutex<QueueInner>,
    capacity: usize,
}

impl Default for StoreEventQueue {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }
}

impl StoreEventQueue {
    /// Creates a queue holding at most `capacity` events (at least one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(QueueInner::default()),
            capacity: capacity.max(1),
        }
    }

    /// Appends an event, evicting the oldest one when full.
    pub fn push(&self, event: StoreEvent) {
        let mut inner = self.inner.lock();
        if inner.events.len() >= self.capacity {
            if let Some(evicted) = inner.events.pop_front() {
                inner.dropped += 1;
                tracing::warn!(
                    capacity = self.capacity,
                    dropped = inner.dropped,
                    evicted = ?evicted,
                    "store event queue full, dropping oldest event"
                );
            }
        }
        inner.events.push_back(event);
    }

    /// Removes and returns every queued event, oldest first.
    #[must_use]
    pub fn drain(&self) -> Vec<StoreEvent> {
        let mut inner = self.inner.lock();
        inner.dropped = 0;
        inner.events.drain(..).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().events.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
