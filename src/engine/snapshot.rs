//! Published, immutable view of the directory.
//!
//! A [`DirectorySnapshot`] is built under the engine lock and handed out
//! behind an `Arc`, so readers always observe a fully formed state and never
//! an intermediate one.

use crate::domain::{Entry, ErrorKind};

/// Display-ready directory state for presentation layers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectorySnapshot {
    /// Increases on every publication.
    pub generation: u64,

    /// Ticket of the load whose catalog is installed; `0` before the first
    /// successful load.
    pub catalog_version: u64,

    /// A load newer than the installed catalog is in flight.
    pub loading: bool,

    /// Last error worth showing (currently only `FetchFailed`).
    pub error: Option<ErrorKind>,

    /// Size of the canonical collection.
    pub total: usize,

    /// Number of favorites in the canonical collection.
    pub favorite_count: usize,

    pub search_prefix: String,
    pub favorite_only: bool,

    /// Query view in canonical order.
    pub results: Vec<Entry>,

    /// Highlighted entry, always a member of `results`.
    pub selected: Option<Entry>,
}

/// Coarse load state derived from a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// Nothing requested yet.
    Idle,
    Loading,
    /// Catalog installed with this many entries.
    Loaded(usize),
    Failed(ErrorKind),
}

impl DirectorySnapshot {
    /// Classifies the snapshot into "still loading", "loaded" or "failed".
    ///
    /// # Examples
    ///
    /// ```
    /// use citydex::engine::{DirectorySnapshot, LoadStatus};
    /// use citydex::domain::ErrorKind;
    ///
    /// let mut snapshot = DirectorySnapshot::default();
    /// assert_eq!(snapshot.status(), LoadStatus::Idle);
    ///
    /// snapshot.error = Some(ErrorKind::FetchFailed);
    /// assert_eq!(snapshot.status(), LoadStatus::Failed(ErrorKind::FetchFailed));
    /// ```
    #[must_use]
    pub fn status(&self) -> LoadStatus {
        if self.loading {
            LoadStatus::Loading
        } else if let Some(kind) = self.error {
            LoadStatus::Failed(kind)
        } else if self.catalog_version == 0 {
            LoadStatus::Idle
        } else {
            LoadStatus::Loaded(self.total)
        }
    }

    /// Names of the current results, handy for logging and assertions.
    #[must_use]
    pub fn result_names(&self) -> Vec<&str> {
        self.results.iter().map(|e| &*e.name).collect()
    }
}
