//! Directory entry domain model.
//!
//! An [`Entry`] is one city in the directory: an immutable identity (id, name,
//! country, coordinates) plus the mutable favorite flag. [`RawEntry`] is the
//! shape the remote catalog delivers, before it is annotated with favorite
//! status during a merge.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Stable identity of a directory entry.
///
/// Derived from the remote catalog's numeric `_id`. This is also the key under
/// which favorites are persisted, so two cities sharing a name never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntryId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Self)
    }
}

/// Geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Returns `true` when latitude is in `[-90, 90]` and longitude in `[-180, 180]`.
    ///
    /// NaN never validates.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// One record of the canonical collection.
///
/// Display strings are reference-counted so that publishing a query view
/// clones pointers rather than text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub name: Arc<str>,
    pub country: Arc<str>,
    pub coordinates: Coordinates,
    pub is_favorite: bool,
}

impl Entry {
    /// Creates a new entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use citydex::domain::{Coordinates, Entry, EntryId};
    ///
    /// let paris = Entry::new(EntryId(2988507), "Paris", "FR", Coordinates::new(48.85, 2.35));
    /// assert!(!paris.is_favorite);
    /// assert_eq!(&*paris.name, "Paris");
    /// ```
    #[must_use]
    pub fn new(
        id: EntryId,
        name: impl Into<Arc<str>>,
        country: impl Into<Arc<str>>,
        coordinates: Coordinates,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            country: country.into(),
            coordinates,
            is_favorite: false,
        }
    }

    /// Builder-style setter for the favorite flag.
    #[must_use]
    pub const fn with_favorite(mut self, is_favorite: bool) -> Self {
        self.is_favorite = is_favorite;
        self
    }

    /// Canonical directory order.
    ///
    /// Byte-wise (case-sensitive) comparison of `name`, then `country`, then
    /// `id` so that the order is total even for exact duplicates.
    #[must_use]
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.country.cmp(&other.country))
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Coordinate pair as delivered by the catalog (`{"lon": .., "lat": ..}`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawCoordinates {
    pub lon: f64,
    pub lat: f64,
}

/// One catalog record before merging.
///
/// ```json
/// {"country": "UA", "name": "Hurzuf", "_id": 707860, "coord": {"lon": 34.28, "lat": 44.54}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEntry {
    pub country: String,
    pub name: String,
    #[serde(rename = "_id")]
    pub id: u64,
    pub coord: RawCoordinates,
}

impl RawEntry {
    #[must_use]
    pub fn new(id: u64, name: impl Into<String>, country: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            country: country.into(),
            name: name.into(),
            id,
            coord: RawCoordinates { lon, lat },
        }
    }

    #[must_use]
    pub const fn entry_id(&self) -> EntryId {
        EntryId(self.id)
    }

    /// Checks the record can become an [`Entry`].
    ///
    /// # Errors
    ///
    /// Returns a short reason when the name is blank or the coordinates are
    /// out of range.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("empty name");
        }
        if !Coordinates::new(self.coord.lat, self.coord.lon).is_valid() {
            return Err("coordinates out of range");
        }
        Ok(())
    }

    /// Converts into an [`Entry`] carrying the given favorite flag.
    #[must_use]
    pub fn into_entry(self, is_favorite: bool) -> Entry {
        Entry {
            id: EntryId(self.id),
            name: self.name.into(),
            country: self.country.into(),
            coordinates: Coordinates::new(self.coord.lat, self.coord.lon),
            is_favorite,
        }
    }
}
