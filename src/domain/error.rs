//! Error types for the directory engine.
//!
//! This module defines the centralized error type [`DirectoryError`], the
//! snapshot-friendly [`ErrorKind`] and a [`Result`] alias used throughout the
//! crate. All errors are implemented with `thiserror`.
//!
//! None of these errors is fatal to the process: fetch failures leave the
//! current collection in place, store failures are reported and retried, and
//! unknown ids are rejected without side effects.

use crate::domain::entry::EntryId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The main error type for directory operations.
///
/// # Examples
///
/// ```
/// use citydex::domain::{DirectoryError, EntryId, ErrorKind};
///
/// let err = DirectoryError::EntryNotFound(EntryId(42));
/// assert_eq!(err.kind(), ErrorKind::EntryNotFound);
/// assert_eq!(err.to_string(), "Entry not found: 42");
/// ```
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The remote catalog could not be fetched or decoded.
    ///
    /// Network errors, non-success statuses, timeouts and malformed payloads
    /// all collapse into this variant.
    #[error("Catalog fetch failed: {0}")]
    FetchFailed(String),

    /// The favorite store could not be opened or read.
    #[error("Favorite store unavailable: {0}")]
    StoreUnavailable(String),

    /// A durable favorite write (upsert or delete) failed.
    #[error("Favorite store write failed for {id}: {reason}")]
    StoreWriteFailed {
        /// Entry whose write failed.
        id: EntryId,
        /// Underlying failure description.
        reason: String,
    },

    /// A command referenced an id that is not in the canonical collection.
    #[error("Entry not found: {0}")]
    EntryNotFound(EntryId),

    /// Filesystem or I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The background write worker is gone.
    #[error("Worker communication error: {0}")]
    Worker(String),
}

impl DirectoryError {
    /// Returns the coarse kind published in snapshots and store events.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::FetchFailed(_) => ErrorKind::FetchFailed,
            Self::StoreUnavailable(_) | Self::Io(_) => ErrorKind::StoreUnavailable,
            Self::StoreWriteFailed { .. } | Self::Worker(_) => ErrorKind::StoreWriteFailed,
            Self::EntryNotFound(_) => ErrorKind::EntryNotFound,
            Self::Config(_) => ErrorKind::Config,
        }
    }
}

/// Copyable error classification exposed to presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    FetchFailed,
    StoreUnavailable,
    StoreWriteFailed,
    EntryNotFound,
    Config,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::FetchFailed => "catalog unavailable",
            Self::StoreUnavailable => "favorites unavailable",
            Self::StoreWriteFailed => "favorite not saved",
            Self::EntryNotFound => "entry not found",
            Self::Config => "configuration error",
        };
        f.write_str(label)
    }
}

/// A specialized `Result` type for directory operations.
pub type Result<T> = std::result::Result<T, DirectoryError>;
