//! # tessera-shared
//!
//! Domain types shared between the store and the HTTP server: the field
//! type catalog, typed attribute values and reconstructed entries.

pub mod constants;
pub mod types;

pub use types::{DeclarationKind, Entry, EntryId, FieldValue, UnknownDeclarationKind};
