//! Value store: one row per `(entry, field)` fact.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use rusqlite::{params, params_from_iter};
use tessera_shared::EntryId;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Value;
use crate::rows::{timestamp_at, uuid_at};

const UPSERT_SQL: &str = "INSERT INTO entry_values (id, entry, field_id, value, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?5)
     ON CONFLICT(entry, field_id) DO UPDATE
     SET value = excluded.value, updated_at = excluded.updated_at";

impl Database {
    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Every value written against any of `field_ids`, in one round trip.
    ///
    /// Rows come back in no particular order.
    pub fn values_for_fields(&self, field_ids: &[Uuid]) -> Result<Vec<Value>> {
        if field_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; field_ids.len()].join(", ");
        let sql = format!(
            "SELECT id, entry, field_id, value, updated_at
             FROM entry_values
             WHERE field_id IN ({placeholders})"
        );
        let ids: Vec<String> = field_ids.iter().map(Uuid::to_string).collect();

        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(ids.iter()), row_to_value)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// Smallest entry id above every id already used by the model.
    pub fn next_entry_id(&self, model_id: Uuid) -> Result<EntryId> {
        let next: i64 = self.conn().query_row(
            "SELECT COALESCE(MAX(v.entry), 0) + 1
             FROM entry_values v
             JOIN fields f ON f.id = v.field_id
             WHERE f.model_id = ?1",
            params![model_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(next)
    }

    // ------------------------------------------------------------------
    // Write
    // ------------------------------------------------------------------

    /// Insert or overwrite a single value.
    pub fn put_value(&self, entry: EntryId, field_id: Uuid, raw: &str) -> Result<()> {
        self.get_field(field_id)?;
        self.conn().execute(
            UPSERT_SQL,
            params![
                Uuid::new_v4().to_string(),
                entry,
                field_id.to_string(),
                raw,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Save the attributes of one entry of a model, keyed by field
    /// identifier.  Allocates a fresh entry id when `entry` is `None`.
    ///
    /// All values are written in a single transaction; an unknown identifier
    /// rejects the whole save.  Attributes not named are left untouched.  An
    /// empty attribute map is rejected, since it would write nothing.
    pub fn save_entry(
        &mut self,
        model_identifier: &str,
        entry: Option<EntryId>,
        attributes: &BTreeMap<String, String>,
    ) -> Result<EntryId> {
        if attributes.is_empty() {
            return Err(StoreError::Invalid("entry has no attributes".into()));
        }
        let model = self.get_model_by_identifier(model_identifier)?;
        let field_ids: HashMap<String, Uuid> = self
            .list_fields(model.id)?
            .into_iter()
            .map(|f| (f.identifier, f.id))
            .collect();

        let mut resolved = Vec::with_capacity(attributes.len());
        for (identifier, raw) in attributes {
            let field_id = field_ids.get(identifier).ok_or_else(|| StoreError::UnknownField {
                model: model.identifier.clone(),
                field: identifier.clone(),
            })?;
            resolved.push((*field_id, raw.as_str()));
        }

        let entry = match entry {
            Some(id) => id,
            None => self.next_entry_id(model.id)?,
        };

        let now = Utc::now().to_rfc3339();
        let tx = self.conn_mut().transaction()?;
        {
            let mut stmt = tx.prepare(UPSERT_SQL)?;
            for (field_id, raw) in &resolved {
                stmt.execute(params![
                    Uuid::new_v4().to_string(),
                    entry,
                    field_id.to_string(),
                    raw,
                    now,
                ])?;
            }
        }
        tx.commit()?;

        tracing::debug!(
            model = %model.identifier,
            entry,
            attributes = resolved.len(),
            "entry saved"
        );
        Ok(entry)
    }

    /// Remove every value of one entry of one model.  Values another model
    /// stored under the same entry id are untouched.
    pub fn delete_entry(&self, model_id: Uuid, entry: EntryId) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM entry_values
             WHERE entry = ?1
               AND field_id IN (SELECT id FROM fields WHERE model_id = ?2)",
            params![entry, model_id.to_string()],
        )?;
        Ok(affected > 0)
    }

    /// Delete values whose field no longer exists.  Returns the number of
    /// rows removed.
    pub fn purge_orphan_values(&self) -> Result<usize> {
        let removed = self.conn().execute(
            "DELETE FROM entry_values WHERE field_id NOT IN (SELECT id FROM fields)",
            [],
        )?;
        if removed > 0 {
            tracing::info!(removed, "purged orphan values");
        }
        Ok(removed)
    }
}

fn row_to_value(row: &rusqlite::Row<'_>) -> rusqlite::Result<Value> {
    Ok(Value {
        id: uuid_at(row, 0)?,
        entry: row.get(1)?,
        field_id: uuid_at(row, 2)?,
        value: row.get(3)?,
        updated_at: timestamp_at(row, 4)?,
    })
}
