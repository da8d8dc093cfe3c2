//! Storage layer for persistent favorite flags.
//!
//! The engine only depends on the [`FavoriteStore`] trait; which backend is
//! used is decided at startup from the configuration.
//!
//! # Modules
//!
//! - `backend`: `FavoriteStore` trait abstraction
//! - `json`: JSON file backend with atomic writes
//! - `memory`: in-process backend
//! - `models`: persisted record types, separate from domain models

pub mod backend;
pub mod json;
pub mod memory;
pub mod models;

pub use backend::{FavoriteStore, SharedFavoriteStore};
pub use json::JsonFavoriteStore;
pub use memory::{MemoryFavoriteStore, StoreOp};
pub use models::FavoriteRecord;
