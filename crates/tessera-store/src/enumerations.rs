//! CRUD operations for [`Enumeration`] records.

use chrono::Utc;
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{classify, Result, StoreError};
use crate::models::Enumeration;
use crate::rows::{timestamp_at, uuid_at};
use crate::validation::{require_non_empty, validate_identifier};

impl Database {
    /// Insert a new option list for an app.  Options keep their order;
    /// blank or repeated options are rejected.
    pub fn create_enumeration(
        &self,
        app_id: Uuid,
        enumeration_name: &str,
        identifier: &str,
        values: &[String],
    ) -> Result<Enumeration> {
        require_non_empty("enumeration name", enumeration_name)?;
        validate_identifier(identifier)?;
        check_options(values)?;
        self.get_app(app_id)?;

        let enumeration = Enumeration {
            id: Uuid::new_v4(),
            app_id,
            enumeration_name: enumeration_name.trim().to_string(),
            identifier: identifier.to_string(),
            values: values.to_vec(),
            created_at: Utc::now(),
        };

        self.conn()
            .execute(
                "INSERT INTO enumerations (id, app_id, enumeration_name, identifier, values_json, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    enumeration.id.to_string(),
                    enumeration.app_id.to_string(),
                    enumeration.enumeration_name,
                    enumeration.identifier,
                    serde_json::to_string(&enumeration.values)?,
                    enumeration.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| {
                classify(
                    e,
                    &format!("enumeration '{identifier}' already exists in this app"),
                )
            })?;

        Ok(enumeration)
    }

    pub fn get_enumeration(&self, id: Uuid) -> Result<Enumeration> {
        let raw = self
            .conn()
            .query_row(
                "SELECT id, app_id, enumeration_name, identifier, values_json, created_at
                 FROM enumerations WHERE id = ?1",
                params![id.to_string()],
                row_to_raw,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })?;
        raw.decode()
    }

    pub fn list_enumerations(&self, app_id: Uuid) -> Result<Vec<Enumeration>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, app_id, enumeration_name, identifier, values_json, created_at
             FROM enumerations
             WHERE app_id = ?1
             ORDER BY enumeration_name ASC",
        )?;
        let rows = stmt.query_map(params![app_id.to_string()], row_to_raw)?;

        let mut enumerations = Vec::new();
        for row in rows {
            enumerations.push(row?.decode()?);
        }
        Ok(enumerations)
    }

    /// Replace the option list.  Stored dropdown values are not rewritten.
    pub fn set_enumeration_values(&self, id: Uuid, values: &[String]) -> Result<Enumeration> {
        check_options(values)?;
        let affected = self.conn().execute(
            "UPDATE enumerations SET values_json = ?1 WHERE id = ?2",
            params![serde_json::to_string(values)?, id.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_enumeration(id)
    }

    // Dropdown fields pointing here fall back to enumeration_id = NULL.
    pub fn delete_enumeration(&self, id: Uuid) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM enumerations WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(affected > 0)
    }
}

fn check_options(values: &[String]) -> Result<()> {
    for (i, value) in values.iter().enumerate() {
        require_non_empty("enumeration option", value)?;
        if values[..i].contains(value) {
            return Err(StoreError::Invalid(format!(
                "enumeration option '{value}' is repeated"
            )));
        }
    }
    Ok(())
}

/// Row with the option list still encoded; JSON errors surface as
/// [`StoreError::Json`] rather than as a rusqlite conversion failure.
struct RawEnumeration {
    enumeration: Enumeration,
    values_json: String,
}

impl RawEnumeration {
    fn decode(mut self) -> Result<Enumeration> {
        self.enumeration.values = serde_json::from_str(&self.values_json)?;
        Ok(self.enumeration)
    }
}

fn row_to_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEnumeration> {
    Ok(RawEnumeration {
        enumeration: Enumeration {
            id: uuid_at(row, 0)?,
            app_id: uuid_at(row, 1)?,
            enumeration_name: row.get(2)?,
            identifier: row.get(3)?,
            values: Vec::new(),
            created_at: timestamp_at(row, 5)?,
        },
        values_json: row.get(4)?,
    })
}
