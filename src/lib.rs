//! Citydex: a favorite-aware, prefix-searchable directory of cities.
//!
//! Citydex keeps a large remote catalog of places in memory and lets a
//! presentation layer:
//! - Search it by case-insensitive name prefix
//! - Mark entries as favorites, persisted durably in the background
//! - Narrow the view to favorites only
//! - Reload the catalog at any time without losing in-flight favorite choices

#![allow(clippy::multiple_crate_versions)]

//!
//! # Architecture
//!
//! The crate follows a layered architecture pattern:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Terminal front end (main.rs)                       │  ← Entry point
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Engine (engine/)                                   │  ← State machine
//! │  - Command handling                                 │  ← Business logic
//! │  - Query view computation                           │
//! │  - Snapshot publication                             │
//! └─────────────────────────────────────────────────────┘
//!         │                    │                    │
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ Catalog       │   │ Storage       │   │ Worker        │
//! │ (catalog/)    │   │ (storage/)    │   │ (worker/)     │
//! │ - HTTP fetch  │   │ - JSON I/O    │   │ - FIFO writes │
//! │ - Local file  │   │ - In-memory   │   │ - Store events│
//! └───────────────┘   └───────────────┘   └───────────────┘
//!         │                    │                    │
//! ┌─────────────────────────────────────────────────────┐
//! │  Infrastructure & Domain Layers                     │
//! │  - Platform paths (infrastructure/)                 │
//! │  - Error types (domain/error)                       │
//! │  - Entry model (domain/entry)                       │
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Observability (observability/)                     │
//! │  - tracing + rotating log file                      │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`engine`]: Canonical collection, query view and the async engine
//! - [`domain`]: Core domain types (Entry, errors)
//! - [`catalog`]: Catalog fetchers (HTTP, file, in-memory)
//! - [`storage`]: Favorite persistence (JSON file, in-memory)
//! - [`worker`]: Background favorite writer
//! - [`infrastructure`]: Platform-specific utilities (paths)
//! - [`observability`]: Logging setup
//!
//! # Configuration
//!
//! Configuration is read from a TOML file and can be overridden with
//! `key=value` pairs:
//!
//! ```toml
//! catalog_url = "https://example.com/cities.json"
//! request_timeout_secs = 20
//! favorites_file = "favorites.json"
//! trace_level = "debug"
//! ```
//!
//! # Example
//!
//! ```rust
//! use citydex::catalog::StaticCatalog;
//! use citydex::domain::{EntryId, RawEntry};
//! use citydex::engine::DirectoryEngine;
//! use citydex::storage::MemoryFavoriteStore;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> citydex::Result<()> {
//! let catalog = Arc::new(StaticCatalog::new(vec![
//!     RawEntry::new(1, "Buenos Aires", "AR", -34.6, -58.4),
//!     RawEntry::new(2, "New York", "US", 40.7, -74.0),
//! ]));
//! let engine = DirectoryEngine::new(catalog, Arc::new(MemoryFavoriteStore::new()));
//!
//! engine.load().await?;
//! engine.set_search_prefix("new")?;
//! assert_eq!(engine.snapshot().result_names(), ["New York"]);
//!
//! engine.toggle_favorite(EntryId(2))?;
//! engine.flush().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Key Design Decisions
//!
//! ## Identity-Keyed Favorites
//!
//! Favorites are matched to catalog entries by the catalog's numeric id,
//! never by name, so two cities sharing a name are never confused.
//!
//! ## Single Writer, Published Snapshots
//!
//! One lock serializes every mutation. Readers only ever see immutable
//! snapshots published through a `watch` channel.
//!
//! ## Worker-Based Persistence
//!
//! Store writes run on a background task in FIFO order:
//! - Toggles never wait for disk
//! - Writes for one entry never interleave
//! - Failures are reported, never silently dropped

pub mod catalog;
pub mod domain;
pub mod engine;
pub mod infrastructure;
pub mod storage;
pub mod worker;

pub mod observability;

pub use domain::{DirectoryError, Entry, EntryId, ErrorKind, Result};
pub use engine::{DirectoryEngine, DirectorySnapshot, LoadOutcome, LoadStatus};
pub use worker::StoreEvent;

use catalog::{FileCatalogFetcher, HttpCatalogFetcher, SharedCatalogFetcher};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use storage::JsonFavoriteStore;

/// Public catalog of world cities used when no other source is configured.
pub const DEFAULT_CATALOG_URL: &str = "https://gist.githubusercontent.com/hernan-uala/dce8843a8edbe0b0018b32e137bc2b3a/raw/0996accf70cb0ca0e16f9a99e0ee185fafca7af1/cities.json";

/// Application configuration.
///
/// Every field has a default, so an empty TOML document is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote catalog location. Ignored when `catalog_file` is set.
    pub catalog_url: String,

    /// Local catalog file with the same JSON shape as the remote payload.
    pub catalog_file: Option<PathBuf>,

    /// Directory for the favorite store and the log file.
    ///
    /// Default: the platform data directory.
    pub data_dir: Option<PathBuf>,

    /// Favorite store file name, relative to `data_dir` unless absolute.
    /// Default: `"favorites.json"`
    pub favorites_file: String,

    /// Timeout for the whole catalog request. Default: 30
    pub request_timeout_secs: u64,

    /// Tracing level.
    ///
    /// Options: `trace`, `debug`, `info`, `warn`, `error`. Default: `"info"`
    pub trace_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            catalog_file: None,
            data_dir: None,
            favorites_file: "favorites.json".to_string(),
            request_timeout_secs: 30,
            trace_level: None,
        }
    }
}

impl Config {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Config`] if the document is not valid TOML or
    /// a field has the wrong type.
    ///
    /// # Example
    ///
    /// ```rust
    /// use citydex::Config;
    ///
    /// let config = Config::from_toml_str("request_timeout_secs = 5")?;
    /// assert_eq!(config.request_timeout_secs, 5);
    /// assert_eq!(config.favorites_file, "favorites.json");
    /// # Ok::<(), citydex::DirectoryError>(())
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str::<Self>(source)
            .map(Self::expand_paths)
            .map_err(|e| DirectoryError::Config(format!("invalid config: {e}")))
    }

    /// Reads and parses a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Config`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| DirectoryError::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    /// Builds a config from `key=value` overrides on top of the defaults.
    ///
    /// # Parsing Rules
    ///
    /// - Unknown keys are ignored
    /// - `request_timeout_secs`: falls back to the default on parse error
    /// - `catalog_file`, `data_dir`, `trace_level`: empty value clears the option
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::collections::BTreeMap;
    /// use citydex::Config;
    ///
    /// let mut map = BTreeMap::new();
    /// map.insert("request_timeout_secs".to_string(), "5".to_string());
    /// map.insert("trace_level".to_string(), "debug".to_string());
    ///
    /// let config = Config::from_pairs(&map);
    /// assert_eq!(config.request_timeout_secs, 5);
    /// assert_eq!(config.trace_level.as_deref(), Some("debug"));
    /// ```
    #[must_use]
    pub fn from_pairs(pairs: &BTreeMap<String, String>) -> Self {
        let mut config = Self::default();
        config.merge_pairs(pairs);
        config
    }

    /// Applies `key=value` overrides to this config.
    pub fn merge_pairs(&mut self, pairs: &BTreeMap<String, String>) {
        let optional_path = |value: &str| (!value.trim().is_empty()).then(|| PathBuf::from(value.trim()));

        for (key, value) in pairs {
            match key.as_str() {
                "catalog_url" => self.catalog_url = value.trim().to_string(),
                "catalog_file" => self.catalog_file = optional_path(value),
                "data_dir" => self.data_dir = optional_path(value),
                "favorites_file" => self.favorites_file = value.trim().to_string(),
                "request_timeout_secs" => {
                    self.request_timeout_secs = value
                        .trim()
                        .parse()
                        .unwrap_or_else(|_| Self::default().request_timeout_secs);
                }
                "trace_level" => {
                    self.trace_level = (!value.trim().is_empty()).then(|| value.trim().to_string());
                }
                other => tracing::debug!(key = other, "ignoring unknown config key"),
            }
        }

        let expanded = std::mem::take(self).expand_paths();
        *self = expanded;
    }

    fn expand_paths(mut self) -> Self {
        let expand = |path: PathBuf| match path.to_str() {
            Some(text) => infrastructure::expand_tilde(text),
            None => path,
        };
        self.catalog_file = self.catalog_file.map(expand);
        self.data_dir = self.data_dir.map(expand);
        self
    }

    /// Data directory, falling back to the platform default.
    #[must_use]
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(infrastructure::data_dir)
    }

    /// Full path of the favorite store file.
    #[must_use]
    pub fn favorites_path(&self) -> PathBuf {
        self.resolved_data_dir()
            .join(infrastructure::expand_tilde(&self.favorites_file))
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Builds an engine from configuration.
///
/// Chooses the local catalog file when one is configured and the HTTP catalog
/// otherwise, and persists favorites to [`Config::favorites_path`]. Must be
/// called inside a tokio runtime; the catalog is not loaded yet.
///
/// # Errors
///
/// Returns [`DirectoryError::Config`] if the HTTP client cannot be built.
pub fn initialize(config: &Config) -> Result<DirectoryEngine> {
    tracing::debug!(
        catalog_url = %config.catalog_url,
        catalog_file = ?config.catalog_file,
        favorites = ?config.favorites_path(),
        "initializing citydex"
    );

    let fetcher: SharedCatalogFetcher = match &config.catalog_file {
        Some(path) => Arc::new(FileCatalogFetcher::new(path.clone())),
        None => Arc::new(HttpCatalogFetcher::new(
            config.catalog_url.clone(),
            config.request_timeout(),
        )?),
    };
    let store = Arc::new(JsonFavoriteStore::new(config.favorites_path()));

    Ok(DirectoryEngine::new(fetcher, store))
}
