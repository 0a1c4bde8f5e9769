//! Schema registry records persisted in the SQLite database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to the HTTP layer.  Entries are not here: they are never stored
//! and live in `tessera_shared::Entry`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tessera_shared::{DeclarationKind, EntryId};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// Tenant container owning models and enumerations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub id: Uuid,
    pub name: String,
    pub identifier: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// A content type such as "Article".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Model {
    pub id: Uuid,
    pub app_id: Uuid,
    /// Human-readable name.
    pub model_name: String,
    /// Globally unique key used by content queries.
    pub identifier: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Declaration
// ---------------------------------------------------------------------------

/// Field type descriptor.  Reference data: only the seeder writes these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Declaration {
    pub id: Uuid,
    pub kind: DeclarationKind,
    pub name: String,
    pub icon: String,
    pub color: String,
}

// ---------------------------------------------------------------------------
// Field
// ---------------------------------------------------------------------------

/// An attribute definition on a model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Field {
    pub id: Uuid,
    /// Owning model.  Never changes after creation.
    pub model_id: Uuid,
    /// Unique within the owning model.
    pub identifier: String,
    pub declaration_id: Uuid,
    /// Resolved from `declaration_id` when the field is loaded.
    pub kind: DeclarationKind,
    /// Presentation order.
    pub position: i64,
    pub default_value: Option<String>,
    pub is_required: bool,
    pub is_unique: bool,
    pub is_hide: bool,
    pub is_system: bool,
    pub is_primary_key: bool,
    pub is_media: bool,
    /// Option list for dropdown fields.
    pub enumeration_id: Option<Uuid>,
    /// Outgoing reference edge for reference fields.
    pub reference_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Input for [`Database::create_field`](crate::Database::create_field).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewField {
    pub identifier: String,
    pub declaration: Option<DeclarationKind>,
    pub position: i64,
    pub default_value: Option<String>,
    pub is_required: bool,
    pub is_unique: bool,
    pub is_hide: bool,
    pub is_system: bool,
    pub is_primary_key: bool,
    pub is_media: bool,
    pub enumeration_id: Option<Uuid>,
    pub reference_id: Option<Uuid>,
}

impl NewField {
    pub fn new(identifier: impl Into<String>, declaration: DeclarationKind) -> Self {
        Self {
            identifier: identifier.into(),
            declaration: Some(declaration),
            ..Self::default()
        }
    }
}

/// Partial update for a field.  `None` leaves the attribute untouched; the
/// owning model and the declaration cannot be changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldPatch {
    pub position: Option<i64>,
    pub default_value: Option<String>,
    /// Remove the default value.  Wins over `default_value`.
    pub clear_default_value: bool,
    pub is_required: Option<bool>,
    pub is_unique: Option<bool>,
    pub is_hide: Option<bool>,
    pub is_system: Option<bool>,
    pub is_primary_key: Option<bool>,
    pub is_media: Option<bool>,
}

// ---------------------------------------------------------------------------
// Enumeration
// ---------------------------------------------------------------------------

/// App-scoped list of allowed dropdown options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Enumeration {
    pub id: Uuid,
    pub app_id: Uuid,
    pub enumeration_name: String,
    pub identifier: String,
    pub values: Vec<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Reference
// ---------------------------------------------------------------------------

/// Directed edge `parent_model -> target_model`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reference {
    pub id: Uuid,
    pub parent_model_id: Uuid,
    pub target_model_id: Uuid,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// One atomic `(entry, field, value)` fact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Value {
    pub id: Uuid,
    pub entry: EntryId,
    pub field_id: Uuid,
    /// Raw scalar as written; typed on read.
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Bootstrap records
// ---------------------------------------------------------------------------

/// An administrative identity.  Credentials are issued elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// A default UI string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Translation {
    pub id: Uuid,
    pub locale: String,
    pub key: String,
    pub text: String,
}
