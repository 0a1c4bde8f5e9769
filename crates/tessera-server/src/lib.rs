//! # tessera-server
//!
//! HTTP front end for the Tessera content engine.
//!
//! - **Read side**: content queries that rebuild entries from the value
//!   store, with optional reference expansion, sorting and a per-query
//!   timeout
//! - **Write side**: schema management (apps, models, fields, enumerations,
//!   references) and entry saves, gated by a bearer admin token
//!
//! The binary in `main.rs` wires configuration, storage and bootstrap
//! seeding around [`api::serve`].

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod schema_api;
