//! Command handling and state transition logic.
//!
//! Every mutation of [`DirectoryState`] goes through [`handle_command`]. The
//! handler is pure: it updates state and returns whether a new snapshot
//! should be published plus the side effects ([`Action`]s) the engine must
//! run afterwards. This keeps the transition rules testable without a
//! runtime, a store or a network.
//!
//! # Command Types
//!
//! - **Query**: `SetSearchPrefix`, `SetFavoriteOnly`, `Select`
//! - **Favorites**: `ToggleFavorite`, `RetryFavorite`
//! - **Loading**: `LoadStarted`, `LoadCompleted`, `LoadFailed`

use super::collection::Collection;
use super::state::DirectoryState;
use crate::domain::error::{DirectoryError, Result};
use crate::domain::{Entry, EntryId, ErrorKind};

/// Inputs to the directory state machine.
#[derive(Debug, Clone)]
pub enum Command {
    /// Replaces the case-insensitive name prefix filter.
    SetSearchPrefix(String),
    /// Enables or disables the favorite-only filter.
    SetFavoriteOnly(bool),
    /// Flips the favorite flag of one entry.
    ToggleFavorite(EntryId),
    /// Re-issues the durable write for an entry's current flag.
    RetryFavorite(EntryId),
    /// Highlights an entry of the current view.
    Select(EntryId),

    /// A load was requested; allocates the next ticket.
    LoadStarted,
    /// A fetch and merge finished for `ticket`.
    LoadCompleted {
        ticket: u64,
        collection: Collection,
    },
    /// A fetch failed for `ticket`.
    LoadFailed {
        ticket: u64,
        kind: ErrorKind,
    },
}

impl Command {
    /// Short name for spans; the load payload is far too large to debug-print.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SetSearchPrefix(_) => "set_search_prefix",
            Self::SetFavoriteOnly(_) => "set_favorite_only",
            Self::ToggleFavorite(_) => "toggle_favorite",
            Self::RetryFavorite(_) => "retry_favorite",
            Self::Select(_) => "select",
            Self::LoadStarted => "load_started",
            Self::LoadCompleted { .. } => "load_completed",
            Self::LoadFailed { .. } => "load_failed",
        }
    }
}

/// Side effects to run after a command, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Upsert the entry into the favorite store.
    PersistFavorite(Entry),
    /// Delete the entry's key from the favorite store.
    RemoveFavorite(EntryId),
}

impl Action {
    fn write_for(entry: Entry) -> Self {
        if entry.is_favorite {
            Self::PersistFavorite(entry)
        } else {
            Self::RemoveFavorite(entry.id)
        }
    }
}

/// Processes a command, mutates state, and returns `(publish, actions)`.
///
/// # Errors
///
/// Returns [`DirectoryError::EntryNotFound`] when `ToggleFavorite`,
/// `RetryFavorite` or `Select` reference an id that is not in the canonical
/// collection (or, for `Select`, not in the current view). State is left
/// untouched in that case.
///
/// # Example
///
/// ```
/// use citydex::engine::{handle_command, Command, DirectoryState};
///
/// let mut state = DirectoryState::new();
/// let (publish, actions) = handle_command(&mut state, Command::SetFavoriteOnly(true))?;
/// assert!(publish);
/// assert!(actions.is_empty());
/// # Ok::<(), citydex::DirectoryError>(())
/// ```
pub fn handle_command(state: &mut DirectoryState, command: Command) -> Result<(bool, Vec<Action>)> {
    let _span = tracing::debug_span!("handle_command", command = command.name()).entered();

    match command {
        Command::SetSearchPrefix(prefix) => {
            let changed = state.set_search_prefix(&prefix);
            tracing::trace!(prefix = %prefix, changed, "search prefix updated");
            Ok((changed, vec![]))
        }
        Command::SetFavoriteOnly(favorite_only) => {
            let changed = state.set_favorite_only(favorite_only);
            tracing::debug!(favorite_only, changed, "favorite filter updated");
            Ok((changed, vec![]))
        }
        Command::ToggleFavorite(id) => {
            let current = state
                .entry(id)
                .map(|entry| entry.is_favorite)
                .ok_or(DirectoryError::EntryNotFound(id))?;

            let entry = state
                .set_favorite(id, !current)
                .ok_or(DirectoryError::EntryNotFound(id))?;

            tracing::debug!(
                id = %id,
                name = %entry.name,
                is_favorite = entry.is_favorite,
                "favorite toggled"
            );
            Ok((true, vec![Action::write_for(entry)]))
        }
        Command::RetryFavorite(id) => {
            let entry = state
                .entry(id)
                .cloned()
                .ok_or(DirectoryError::EntryNotFound(id))?;
            tracing::debug!(id = %id, is_favorite = entry.is_favorite, "retrying favorite write");
            Ok((false, vec![Action::write_for(entry)]))
        }
        Command::Select(id) => {
            let changed = state.select(id).ok_or(DirectoryError::EntryNotFound(id))?;
            Ok((changed, vec![]))
        }
        Command::LoadStarted => {
            let ticket = state.begin_load();
            tracing::debug!(ticket, "load started");
            Ok((true, vec![]))
        }
        Command::LoadCompleted { ticket, collection } => {
            let entries = collection.len();
            if state.complete_load(ticket, collection) {
                tracing::info!(ticket, entries, "catalog installed");
                Ok((true, vec![]))
            } else {
                tracing::debug!(
                    ticket,
                    applied = state.applied_ticket(),
                    "discarding superseded load result"
                );
                // The loading flag may still have changed.
                Ok((true, vec![]))
            }
        }
        Command::LoadFailed { ticket, kind } => {
            if state.fail_load(ticket, kind) {
                tracing::warn!(ticket, error = %kind, "load failed");
            } else {
                tracing::debug!(ticket, "ignoring failure of superseded load");
            }
            Ok((true, vec![]))
        }
    }
}
