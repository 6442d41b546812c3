//! Catalog persistence layer
//!
//! - [`types`]: entities and version records
//! - [`store`]: the `CatalogStore` boundary trait
//! - [`sqlite`]: SQLite implementation of the store
//! - [`upserter`]: per-kind create-or-update used by every source adapter
//! - [`error`]: catalog error type

pub mod error;
pub mod sqlite;
pub mod store;
pub mod types;
pub mod upserter;
