//! Entry reconstruction: schema-on-read over the value store.
//!
//! An entry is never stored.  It is rebuilt on every read by pivoting the
//! values of one model's fields into `{ id, identifier -> value }` records.
//! A read costs one field lookup and one batched value lookup, however many
//! fields or entries the model has.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tessera_shared::constants::RESERVED_ENTRY_KEY;
use tessera_shared::{DeclarationKind, Entry, EntryId, FieldValue};
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Field, Model, Reference, Value};

// ---------------------------------------------------------------------------
// Read contract
// ---------------------------------------------------------------------------

/// The read side of the schema registry, value store and reference graph.
///
/// Implemented by [`Database`]; the reconstructor only talks to this trait.
pub trait ContentSource {
    /// Resolve a model by identifier.  `None` is a normal outcome.
    fn find_model(&self, identifier: &str) -> Result<Option<Model>>;

    fn model_by_id(&self, id: Uuid) -> Result<Option<Model>>;

    /// All fields of a model.
    fn fields_of(&self, model_id: Uuid) -> Result<Vec<Field>>;

    /// All values of the given fields, in a single round trip.
    fn values_for_fields(&self, field_ids: &[Uuid]) -> Result<Vec<Value>>;

    /// Outgoing reference edges of a model.
    fn references_of(&self, model_id: Uuid) -> Result<Vec<Reference>>;
}

impl ContentSource for Database {
    fn find_model(&self, identifier: &str) -> Result<Option<Model>> {
        self.find_model_by_identifier(identifier)
    }

    fn model_by_id(&self, id: Uuid) -> Result<Option<Model>> {
        self.find_model_by_id(id)
    }

    fn fields_of(&self, model_id: Uuid) -> Result<Vec<Field>> {
        self.list_fields(model_id)
    }

    fn values_for_fields(&self, field_ids: &[Uuid]) -> Result<Vec<Value>> {
        Database::values_for_fields(self, field_ids)
    }

    fn references_of(&self, model_id: Uuid) -> Result<Vec<Reference>> {
        self.list_references(model_id)
    }
}

// ---------------------------------------------------------------------------
// Pivot
// ---------------------------------------------------------------------------

/// Rebuild every entry of the model named `identifier`.
///
/// An unknown model, a model without fields and a model without values all
/// yield an empty list.  Values whose field is not one of the model's fields
/// are skipped.  Entries only carry the attributes that have a value.  The
/// order of the result is unspecified.
pub fn reconstruct<S>(source: &S, identifier: &str) -> Result<Vec<Entry>>
where
    S: ContentSource + ?Sized,
{
    let Some(model) = source.find_model(identifier)? else {
        return Ok(Vec::new());
    };
    let fields = source.fields_of(model.id)?;
    pivot(source, &fields)
}

fn pivot<S>(source: &S, fields: &[Field]) -> Result<Vec<Entry>>
where
    S: ContentSource + ?Sized,
{
    if fields.is_empty() {
        return Ok(Vec::new());
    }

    let by_id: HashMap<Uuid, (&str, DeclarationKind)> = fields
        .iter()
        .map(|f| (f.id, (f.identifier.as_str(), f.kind)))
        .collect();
    let field_ids: Vec<Uuid> = by_id.keys().copied().collect();

    let values = source.values_for_fields(&field_ids)?;

    let mut entries: HashMap<EntryId, Entry> = HashMap::new();
    for value in values {
        let Some((identifier, kind)) = by_id.get(&value.field_id) else {
            continue;
        };
        entries
            .entry(value.entry)
            .or_insert_with(|| Entry::new(value.entry))
            .set(*identifier, FieldValue::coerce(*kind, &value.value));
    }

    Ok(entries.into_values().collect())
}

// ---------------------------------------------------------------------------
// Reference resolution
// ---------------------------------------------------------------------------

/// Like [`reconstruct`], then replace reference values with the entries
/// they point to, up to `max_depth` levels.
///
/// Each target model is rebuilt once per level, not once per entry.  A model
/// already being expanded higher up the chain is not expanded again, so
/// self and mutual references terminate; the raw entry id is kept instead.
/// Ids with no matching target entry also stay raw.
pub fn reconstruct_resolved<S>(source: &S, identifier: &str, max_depth: usize) -> Result<Vec<Entry>>
where
    S: ContentSource + ?Sized,
{
    let Some(model) = source.find_model(identifier)? else {
        return Ok(Vec::new());
    };
    let mut path = Vec::new();
    resolve_model(source, &model, max_depth, &mut path)
}

fn resolve_model<S>(
    source: &S,
    model: &Model,
    depth: usize,
    path: &mut Vec<Uuid>,
) -> Result<Vec<Entry>>
where
    S: ContentSource + ?Sized,
{
    let fields = source.fields_of(model.id)?;
    expand(source, model, &fields, depth, path)
}

/// Pivot a model whose fields are already loaded, then expand its
/// reference fields.
fn expand<S>(
    source: &S,
    model: &Model,
    fields: &[Field],
    depth: usize,
    path: &mut Vec<Uuid>,
) -> Result<Vec<Entry>>
where
    S: ContentSource + ?Sized,
{
    let mut entries = pivot(source, fields)?;

    let links: Vec<(&str, Uuid)> = fields
        .iter()
        .filter(|f| f.kind == DeclarationKind::Reference)
        .filter_map(|f| f.reference_id.map(|r| (f.identifier.as_str(), r)))
        .collect();
    if depth == 0 || entries.is_empty() || links.is_empty() {
        return Ok(entries);
    }

    let edges: HashMap<Uuid, Reference> = source
        .references_of(model.id)?
        .into_iter()
        .map(|r| (r.id, r))
        .collect();

    path.push(model.id);
    let mut targets: HashMap<Uuid, HashMap<EntryId, Entry>> = HashMap::new();

    for (identifier, reference_id) in links {
        let Some(edge) = edges.get(&reference_id) else {
            continue;
        };
        let target_id = edge.target_model_id;
        if path.contains(&target_id) {
            continue;
        }

        if !targets.contains_key(&target_id) {
            let resolved = match source.model_by_id(target_id)? {
                Some(target) => resolve_model(source, &target, depth - 1, path)?,
                None => Vec::new(),
            };
            targets.insert(target_id, resolved.into_iter().map(|e| (e.id, e)).collect());
        }
        let Some(target_entries) = targets.get(&target_id) else {
            continue;
        };

        for entry in &mut entries {
            let linked = entry
                .get(identifier)
                .and_then(FieldValue::as_integer)
                .and_then(|id| target_entries.get(&id));
            if let Some(linked) = linked {
                let nested = FieldValue::Entry(Box::new(linked.clone()));
                entry.set(identifier, nested);
            }
        }
    }

    path.pop();
    Ok(entries)
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Caller-side shaping of a content query.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QueryOptions {
    /// How many levels of reference fields to expand.  0 keeps raw ids.
    pub depth: usize,
    /// Attribute to order by.  Entries lacking it go last.
    pub sort_by: Option<String>,
    pub descending: bool,
}

/// Order entries by one attribute (or by `id`).  Entries missing the
/// attribute sort after all others; ties fall back to the entry id.
pub fn sort_entries(entries: &mut [Entry], key: &str, descending: bool) {
    entries.sort_by(|a, b| {
        let primary = if key == RESERVED_ENTRY_KEY {
            a.id.cmp(&b.id)
        } else {
            match (a.get(key), b.get(key)) {
                (Some(x), Some(y)) => compare_values(x, y),
                (Some(_), None) => return Ordering::Less,
                (None, Some(_)) => return Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        };
        let primary = if descending { primary.reverse() } else { primary };
        primary.then_with(|| a.id.cmp(&b.id))
    });
}

fn compare_values(a: &FieldValue, b: &FieldValue) -> Ordering {
    match (a, b) {
        (FieldValue::Integer(x), FieldValue::Integer(y)) => x.cmp(y),
        (FieldValue::Float(x), FieldValue::Float(y)) => x.total_cmp(y),
        (FieldValue::Integer(x), FieldValue::Float(y)) => (*x as f64).total_cmp(y),
        (FieldValue::Float(x), FieldValue::Integer(y)) => x.total_cmp(&(*y as f64)),
        (FieldValue::Boolean(x), FieldValue::Boolean(y)) => x.cmp(y),
        (FieldValue::Text(x), FieldValue::Text(y)) => x.cmp(y),
        (FieldValue::Entry(x), FieldValue::Entry(y)) => x.id.cmp(&y.id),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn rank(value: &FieldValue) -> u8 {
    match value {
        FieldValue::Boolean(_) => 0,
        FieldValue::Integer(_) | FieldValue::Float(_) => 1,
        FieldValue::Text(_) => 2,
        FieldValue::Entry(_) => 3,
    }
}

/// Rebuild the entries of a model and shape them per `options`.
///
/// The model and its fields are loaded once; the sort key is checked against
/// them before any value is read.  Sorting by an attribute the model does not
/// define is rejected; an unknown model still yields an empty list.
pub fn query<S>(source: &S, identifier: &str, options: &QueryOptions) -> Result<Vec<Entry>>
where
    S: ContentSource + ?Sized,
{
    let Some(model) = source.find_model(identifier)? else {
        return Ok(Vec::new());
    };
    let fields = source.fields_of(model.id)?;

    let sort_key = options.sort_by.as_deref();
    if let Some(key) = sort_key {
        if key != RESERVED_ENTRY_KEY && !fields.iter().any(|f| f.identifier == key) {
            return Err(StoreError::UnknownField {
                model: model.identifier,
                field: key.to_string(),
            });
        }
    }

    let mut entries = if options.depth == 0 {
        pivot(source, &fields)?
    } else {
        expand(source, &model, &fields, options.depth, &mut Vec::new())?
    };
    if let Some(key) = sort_key {
        sort_entries(&mut entries, key, options.descending);
    }
    Ok(entries)
}

impl Database {
    /// [`query`] against this database.
    pub fn query_entries(&self, identifier: &str, options: &QueryOptions) -> Result<Vec<Entry>> {
        let entries = query(self, identifier, options)?;
        tracing::debug!(model = %identifier, entries = entries.len(), "entries reconstructed");
        Ok(entries)
    }
}
