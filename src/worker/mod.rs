//! Background worker for favorite store writes.
//!
//! Store I/O never runs under the engine lock. Toggles enqueue a message and
//! return immediately; the worker applies writes one at a time, in order, and
//! reports outcomes as [`StoreEvent`]s.
//!
//! # Architecture
//!
//! - `messages`: Request types with span propagation
//! - `events`: Store outcomes and the bounded queue they wait in
//! - `handler`: Worker task and the handle the engine sends through

pub mod events;
pub mod handler;
pub mod messages;

pub use events::{StoreEvent, StoreEventQueue, DEFAULT_EVENT_CAPACITY};
pub use handler::{FavoriteWorker, WorkerHandle};
pub use messages::WorkerMessage;
