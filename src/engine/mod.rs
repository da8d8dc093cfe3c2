//! Directory engine: canonical collection, query view and the async front.
//!
//! # Architecture
//!
//! - `collection`: sorted entries with the identity index
//! - `query`: query parameters and the derived view
//! - `state`: plain state container
//! - `handler`: command processing returning publish flag and actions
//! - `snapshot`: immutable published view
//! - `directory`: [`DirectoryEngine`], the lock-owning async front

pub mod collection;
pub mod directory;
pub mod handler;
pub mod query;
pub mod snapshot;
pub mod state;

pub use collection::Collection;
pub use directory::{DirectoryEngine, LoadOutcome};
pub use handler::{handle_command, Action, Command};
pub use query::{QueryParams, QueryView};
pub use snapshot::{DirectorySnapshot, LoadStatus};
pub use state::DirectoryState;
