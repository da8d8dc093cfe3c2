//! Storage record models for the favorite store.
//!
//! These types are the persisted representation of a favorite and are kept
//! separate from the domain [`Entry`] so that the file format can evolve
//! independently of the in-memory model.

use crate::domain::{Coordinates, Entry, EntryId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A favorited entry as written to durable storage.
///
/// The full record is stored (not just the key) so that favorites remain
/// displayable even when the remote catalog is unreachable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteRecord {
    pub id: EntryId,
    pub name: String,
    pub country: String,
    pub coordinates: Coordinates,

    /// When the entry was last marked favorite.
    pub favorited_at: DateTime<Utc>,
}

impl FavoriteRecord {
    /// Builds a record from an entry, stamping the current time.
    ///
    /// # Examples
    ///
    /// ```
    /// use citydex::domain::{Coordinates, Entry, EntryId};
    /// use citydex::storage::FavoriteRecord;
    ///
    /// let entry = Entry::new(EntryId(1), "Paris", "FR", Coordinates::new(48.85, 2.35));
    /// let record = FavoriteRecord::from_entry(&entry);
    /// assert_eq!(record.id, EntryId(1));
    /// assert_eq!(record.name, "Paris");
    /// ```
    #[must_use]
    pub fn from_entry(entry: &Entry) -> Self {
        Self {
            id: entry.id,
            name: entry.name.to_string(),
            country: entry.country.to_string(),
            coordinates: entry.coordinates,
            favorited_at: Utc::now(),
        }
    }
}
