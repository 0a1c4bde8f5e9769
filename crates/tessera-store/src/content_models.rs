//! CRUD operations for [`Model`] records (content types).

use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use crate::database::Database;
use crate::error::{classify, Result, StoreError};
use crate::models::Model;
use crate::rows::{timestamp_at, uuid_at};
use crate::validation::{require_non_empty, validate_identifier};

const MODEL_COLUMNS: &str = "id, app_id, model_name, identifier, created_at";

impl Database {
    /// Insert a new model under an existing app.
    pub fn create_model(&self, app_id: Uuid, model_name: &str, identifier: &str) -> Result<Model> {
        require_non_empty("model name", model_name)?;
        validate_identifier(identifier)?;
        self.get_app(app_id)?;

        let model = Model {
            id: Uuid::new_v4(),
            app_id,
            model_name: model_name.trim().to_string(),
            identifier: identifier.to_string(),
            created_at: Utc::now(),
        };

        self.conn()
            .execute(
                "INSERT INTO models (id, app_id, model_name, identifier, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    model.id.to_string(),
                    model.app_id.to_string(),
                    model.model_name,
                    model.identifier,
                    model.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| classify(e, &format!("model '{identifier}' already exists")))?;

        tracing::info!(model = %model.identifier, app = %app_id, "model created");
        Ok(model)
    }

    pub fn get_model(&self, id: Uuid) -> Result<Model> {
        self.find_model_by_id(id)?.ok_or(StoreError::NotFound)
    }

    /// Resolve a model by its identifier.
    pub fn get_model_by_identifier(&self, identifier: &str) -> Result<Model> {
        self.find_model_by_identifier(identifier)?
            .ok_or(StoreError::NotFound)
    }

    pub(crate) fn find_model_by_id(&self, id: Uuid) -> Result<Option<Model>> {
        let sql = format!("SELECT {MODEL_COLUMNS} FROM models WHERE id = ?1");
        Ok(self
            .conn()
            .query_row(&sql, params![id.to_string()], row_to_model)
            .optional()?)
    }

    pub(crate) fn find_model_by_identifier(&self, identifier: &str) -> Result<Option<Model>> {
        let sql = format!("SELECT {MODEL_COLUMNS} FROM models WHERE identifier = ?1");
        Ok(self
            .conn()
            .query_row(&sql, params![identifier], row_to_model)
            .optional()?)
    }

    /// List the models of one app, ordered by name.
    pub fn list_models(&self, app_id: Uuid) -> Result<Vec<Model>> {
        let sql = format!(
            "SELECT {MODEL_COLUMNS} FROM models WHERE app_id = ?1 ORDER BY model_name ASC"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params![app_id.to_string()], row_to_model)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// Change the display name.  The identifier is the query key and stays.
    pub fn rename_model(&self, id: Uuid, model_name: &str) -> Result<Model> {
        require_non_empty("model name", model_name)?;
        let affected = self.conn().execute(
            "UPDATE models SET model_name = ?1 WHERE id = ?2",
            params![model_name.trim(), id.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_model(id)
    }

    // ON DELETE CASCADE: fields and references go with it.
    pub fn delete_model(&self, id: Uuid) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM models WHERE id = ?1", params![id.to_string()])?;
        if affected > 0 {
            tracing::info!(id = %id, "model deleted");
        }
        Ok(affected > 0)
    }
}

fn row_to_model(row: &rusqlite::Row<'_>) -> rusqlite::Result<Model> {
    Ok(Model {
        id: uuid_at(row, 0)?,
        app_id: uuid_at(row, 1)?,
        model_name: row.get(2)?,
        identifier: row.get(3)?,
        created_at: timestamp_at(row, 4)?,
    })
}
