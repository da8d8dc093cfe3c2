//! Catalog layer: where raw directory entries come from.
//!
//! # Modules
//!
//! - `fetcher`: `CatalogFetcher` trait and payload decoding
//! - `http`: remote catalog over HTTP (`reqwest`)
//! - `local`: JSON file and in-memory catalogs

pub mod fetcher;
pub mod http;
pub mod local;

pub use fetcher::{parse_catalog, CatalogFetcher, SharedCatalogFetcher};
pub use http::HttpCatalogFetcher;
pub use local::{FileCatalogFetcher, StaticCatalog};
