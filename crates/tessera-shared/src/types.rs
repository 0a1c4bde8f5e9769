use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Entry ids are plain integers shared by every Value of one entry.
pub type EntryId = i64;

// ---------------------------------------------------------------------------
// Declaration kinds
// ---------------------------------------------------------------------------

/// The built-in field types.  Exactly these seven are seeded; nothing adds
/// new kinds at runtime.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    String,
    Text,
    Dropdown,
    Integer,
    Float,
    Boolean,
    Reference,
}

#[derive(Debug, Error)]
#[error("Unknown declaration kind: {0}")]
pub struct UnknownDeclarationKind(pub String);

impl DeclarationKind {
    pub const ALL: [DeclarationKind; 7] = [
        Self::String,
        Self::Text,
        Self::Dropdown,
        Self::Integer,
        Self::Float,
        Self::Boolean,
        Self::Reference,
    ];

    /// Stable key stored in the `declarations.kind` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Text => "text",
            Self::Dropdown => "dropdown",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Reference => "reference",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Text => "Text",
            Self::Dropdown => "Dropdown",
            Self::Integer => "Integer",
            Self::Float => "Float",
            Self::Boolean => "Boolean",
            Self::Reference => "Reference",
        }
    }

    /// Icon name shown next to the field type in the admin dashboard.
    pub fn icon(&self) -> &'static str {
        match self {
            Self::String => "type",
            Self::Text => "align-left",
            Self::Dropdown => "list",
            Self::Integer => "hash",
            Self::Float => "percent",
            Self::Boolean => "toggle-left",
            Self::Reference => "link",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::String => "#3b82f6",
            Self::Text => "#6366f1",
            Self::Dropdown => "#f59e0b",
            Self::Integer => "#10b981",
            Self::Float => "#14b8a6",
            Self::Boolean => "#ef4444",
            Self::Reference => "#8b5cf6",
        }
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeclarationKind {
    type Err = UnknownDeclarationKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownDeclarationKind(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Field values
// ---------------------------------------------------------------------------

/// A single attribute of a reconstructed entry.
///
/// Serialized untagged so an entry renders as a flat JSON object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    /// A Reference value replaced by the entry it points to.
    Entry(Box<Entry>),
}

impl FieldValue {
    /// Interpret a raw stored value according to its field's declaration.
    ///
    /// Values that do not parse as their declared type are kept as text so
    /// that one malformed row never hides the rest of an entry.
    pub fn coerce(kind: DeclarationKind, raw: &str) -> Self {
        let trimmed = raw.trim();
        match kind {
            DeclarationKind::Integer | DeclarationKind::Reference => trimmed
                .parse::<i64>()
                .map(Self::Integer)
                .unwrap_or_else(|_| Self::Text(raw.to_string())),
            DeclarationKind::Float => match trimmed.parse::<f64>() {
                Ok(f) if f.is_finite() => Self::Float(f),
                _ => Self::Text(raw.to_string()),
            },
            DeclarationKind::Boolean => match trimmed {
                "true" | "1" => Self::Boolean(true),
                "false" | "0" => Self::Boolean(false),
                _ => Self::Text(raw.to_string()),
            },
            DeclarationKind::String | DeclarationKind::Text | DeclarationKind::Dropdown => {
                Self::Text(raw.to_string())
            }
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_entry(&self) -> Option<&Entry> {
        match self {
            Self::Entry(e) => Some(e),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// A content record reconstructed at read time.  Entries are never stored;
/// an attribute that never received a value is absent from `attributes`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entry {
    pub id: EntryId,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, FieldValue>,
}

impl Entry {
    pub fn new(id: EntryId) -> Self {
        Self {
            id,
            attributes: BTreeMap::new(),
        }
    }

    pub fn get(&self, identifier: &str) -> Option<&FieldValue> {
        self.attributes.get(identifier)
    }

    pub fn set(&mut self, identifier: impl Into<String>, value: FieldValue) {
        self.attributes.insert(identifier.into(), value);
    }

    pub fn with(mut self, identifier: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(identifier, value.into());
        self
    }
}
