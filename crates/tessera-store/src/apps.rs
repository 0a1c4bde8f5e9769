//! CRUD operations for [`App`] records.

use chrono::Utc;
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{classify, Result, StoreError};
use crate::models::App;
use crate::rows::{timestamp_at, uuid_at};
use crate::validation::{require_non_empty, validate_identifier};

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new app.  Identifiers are globally unique.
    pub fn create_app(&self, name: &str, identifier: &str) -> Result<App> {
        require_non_empty("app name", name)?;
        validate_identifier(identifier)?;

        let app = App {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            identifier: identifier.to_string(),
            created_at: Utc::now(),
        };

        self.conn()
            .execute(
                "INSERT INTO apps (id, name, identifier, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    app.id.to_string(),
                    app.name,
                    app.identifier,
                    app.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| classify(e, &format!("app '{identifier}' already exists")))?;

        tracing::info!(app = %app.identifier, id = %app.id, "app created");
        Ok(app)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single app by UUID.
    pub fn get_app(&self, id: Uuid) -> Result<App> {
        self.conn()
            .query_row(
                "SELECT id, name, identifier, created_at FROM apps WHERE id = ?1",
                params![id.to_string()],
                row_to_app,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// List all apps, ordered by name.
    pub fn list_apps(&self) -> Result<Vec<App>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT id, name, identifier, created_at FROM apps ORDER BY name ASC")?;
        let rows = stmt.query_map([], row_to_app)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    // ON DELETE CASCADE: models, fields, enumerations and references go with
    // it.  Values of the removed fields stay behind as orphans.
    pub fn delete_app(&self, id: Uuid) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM apps WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }
}

fn row_to_app(row: &rusqlite::Row<'_>) -> rusqlite::Result<App> {
    Ok(App {
        id: uuid_at(row, 0)?,
        name: row.get(1)?,
        identifier: row.get(2)?,
        created_at: timestamp_at(row, 3)?,
    })
}
