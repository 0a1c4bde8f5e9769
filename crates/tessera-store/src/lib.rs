//! # tessera-store
//!
//! SQLite-backed storage for Tessera's dynamic content schema.
//!
//! Models and their fields are rows, not tables: every attribute of every
//! entry is an `(entry, field, value)` fact in a single value store, and
//! entries are rebuilt on read by the [`entries`] reconstructor.  The crate
//! exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed helpers for every registry.

pub mod apps;
pub mod content_models;
pub mod database;
pub mod declarations;
pub mod entries;
pub mod enumerations;
pub mod fields;
pub mod migrations;
pub mod models;
pub mod references;
pub mod seed;
pub mod translations;
pub mod users;
pub mod validation;
pub mod values;

mod error;
mod rows;

pub use database::Database;
pub use entries::{
    query, reconstruct, reconstruct_resolved, sort_entries, ContentSource, QueryOptions,
};
pub use error::{Result, StoreError};
pub use models::*;
pub use seed::{RootUser, SeedReport};
