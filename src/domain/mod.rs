//! Domain layer for the city directory.
//!
//! Core types independent of any transport, storage backend or front end.
//!
//! # Organization
//!
//! - [`entry`]: `Entry`, `EntryId`, coordinates and the raw catalog record
//! - [`error`]: Error types and result aliases
//!
//! # Examples
//!
//! ```
//! use citydex::domain::{RawEntry, Result};
//!
//! fn parse(json: &str) -> Result<Vec<RawEntry>> {
//!     serde_json::from_str(json)
//!         .map_err(|e| citydex::DirectoryError::FetchFailed(e.to_string()))
//! }
//! ```

pub mod entry;
pub mod error;

pub use entry::{Coordinates, Entry, EntryId, RawCoordinates, RawEntry};
pub use error::{DirectoryError, ErrorKind, Result};
