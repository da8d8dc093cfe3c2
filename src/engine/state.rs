//! Directory state container.
//!
//! [`DirectoryState`] is the single source of truth for the canonical
//! collection, the query parameters, the derived query view, the selection
//! and load bookkeeping. It is plain data: it performs no I/O and is mutated
//! only through [`handle_command`](super::handler::handle_command), which the
//! engine serializes behind one lock.
//!
//! # State Components
//!
//! - **Collection**: sorted entries plus identity index, replaced per load
//! - **Params / View**: current filters and the positions they select
//! - **Selection**: canonical position of the highlighted entry, always in the view
//! - **Intents**: the last favorite flag the user chose per id in this session
//! - **Load tickets**: ordering information used to discard superseded loads

use super::collection::Collection;
use super::query::{QueryParams, QueryView};
use super::snapshot::DirectorySnapshot;
use crate::domain::{Entry, EntryId, ErrorKind};
use std::collections::{BTreeSet, HashMap};

/// Central engine state.
#[derive(Debug, Clone, Default)]
pub struct DirectoryState {
    collection: Collection,
    params: QueryParams,
    view: QueryView,
    selected: Option<usize>,

    /// Favorite choices made in this session, re-applied over every newly
    /// merged catalog so a load racing a toggle cannot undo it.
    intents: HashMap<EntryId, bool>,

    last_ticket: u64,
    applied_ticket: u64,
    in_flight: BTreeSet<u64>,
    error: Option<ErrorKind>,

    generation: u64,
}

impl DirectoryState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn collection(&self) -> &Collection {
        &self.collection
    }

    #[must_use]
    pub const fn params(&self) -> &QueryParams {
        &self.params
    }

    #[must_use]
    pub const fn view(&self) -> &QueryView {
        &self.view
    }

    #[must_use]
    pub fn entry(&self, id: EntryId) -> Option<&Entry> {
        self.collection.get(id)
    }

    #[must_use]
    pub fn selected_entry(&self) -> Option<&Entry> {
        self.selected.and_then(|position| self.collection.at(position))
    }

    #[must_use]
    pub const fn error(&self) -> Option<ErrorKind> {
        self.error
    }

    /// Ticket handed to the most recent `load()`.
    #[must_use]
    pub const fn last_ticket(&self) -> u64 {
        self.last_ticket
    }

    #[must_use]
    pub const fn applied_ticket(&self) -> u64 {
        self.applied_ticket
    }

    /// `true` while a load that could still replace the catalog is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.in_flight
            .last()
            .is_some_and(|&ticket| ticket > self.applied_ticket)
    }

    pub(super) fn set_search_prefix(&mut self, prefix: &str) -> bool {
        if self.params.search_prefix == prefix {
            return false;
        }
        self.params.search_prefix = prefix.to_string();
        self.apply_query();
        true
    }

    pub(super) fn set_favorite_only(&mut self, favorite_only: bool) -> bool {
        if self.params.favorite_only == favorite_only {
            return false;
        }
        self.params.favorite_only = favorite_only;
        self.apply_query();
        true
    }

    /// Recomputes the view from scratch and moves the selection to its head.
    pub(super) fn apply_query(&mut self) {
        self.view = QueryView::compute(&self.collection, &self.params);
        self.selected = self.view.first();
    }

    /// Sets a favorite flag in place and records it as the user's intent.
    ///
    /// Only re-filters when the favorite filter is active, since that is the
    /// only case in which membership of the view can change. The selection
    /// is kept if the entry it points to is still visible.
    pub(super) fn set_favorite(&mut self, id: EntryId, is_favorite: bool) -> Option<Entry> {
        let entry = self.collection.set_favorite(id, is_favorite)?.clone();
        self.intents.insert(id, is_favorite);

        if self.params.favorite_only {
            let previous = self.selected;
            self.view = QueryView::compute(&self.collection, &self.params);
            self.selected = previous
                .filter(|&position| self.view.contains(position))
                .or_else(|| self.view.first());
        }
        Some(entry)
    }

    pub(super) fn select(&mut self, id: EntryId) -> Option<bool> {
        let position = self.collection.position(id)?;
        if !self.view.contains(position) {
            return None;
        }
        let changed = self.selected != Some(position);
        self.selected = Some(position);
        Some(changed)
    }

    pub(super) fn begin_load(&mut self) -> u64 {
        self.last_ticket += 1;
        self.in_flight.insert(self.last_ticket);
        self.last_ticket
    }

    /// Installs a merged collection if `ticket` is newer than the installed one.
    ///
    /// Resets the query parameters to their defaults. Returns `false` when the
    /// result is stale and was discarded.
    pub(super) fn complete_load(&mut self, ticket: u64, mut collection: Collection) -> bool {
        self.in_flight.remove(&ticket);
        if ticket <= self.applied_ticket {
            return false;
        }

        for (&id, &is_favorite) in &self.intents {
            collection.set_favorite(id, is_favorite);
        }

        self.collection = collection;
        self.applied_ticket = ticket;
        self.error = None;
        self.params = QueryParams::default();
        self.apply_query();
        true
    }

    /// Records a failed load. Only the newest request may set the error.
    pub(super) fn fail_load(&mut self, ticket: u64, kind: ErrorKind) -> bool {
        self.in_flight.remove(&ticket);
        if ticket != self.last_ticket || ticket <= self.applied_ticket {
            return false;
        }
        self.error = Some(kind);
        true
    }

    /// Builds the next snapshot to publish.
    pub fn snapshot(&mut self) -> DirectorySnapshot {
        self.generation += 1;
        DirectorySnapshot {
            generation: self.generation,
            catalog_version: self.applied_ticket,
            loading: self.is_loading(),
            error: self.error,
            total: self.collection.len(),
            favorite_count: self.collection.favorite_count(),
            search_prefix: self.params.search_prefix.clone(),
            favorite_only: self.params.favorite_only,
            results: self.view.entries(&self.collection).cloned().collect(),
            selected: self.selected_entry().cloned(),
        }
    }
}
