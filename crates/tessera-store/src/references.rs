//! Reference graph: directed edges between models.

use chrono::Utc;
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{classify, Result, StoreError};
use crate::models::Reference;
use crate::rows::{timestamp_at, uuid_at};

impl Database {
    /// Add the edge `parent -> target`.  Self references are allowed; readers
    /// guard against cycles.
    pub fn create_reference(&self, parent_model_id: Uuid, target_model_id: Uuid) -> Result<Reference> {
        self.get_model(parent_model_id)?;
        self.get_model(target_model_id)?;

        let reference = Reference {
            id: Uuid::new_v4(),
            parent_model_id,
            target_model_id,
            created_at: Utc::now(),
        };

        self.conn()
            .execute(
                "INSERT INTO model_references (id, parent_model_id, target_model_id, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    reference.id.to_string(),
                    reference.parent_model_id.to_string(),
                    reference.target_model_id.to_string(),
                    reference.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| classify(e, "reference between these models already exists"))?;

        tracing::info!(
            parent = %parent_model_id,
            target = %target_model_id,
            "reference created"
        );
        Ok(reference)
    }

    pub fn get_reference(&self, id: Uuid) -> Result<Reference> {
        self.conn()
            .query_row(
                "SELECT id, parent_model_id, target_model_id, created_at
                 FROM model_references WHERE id = ?1",
                params![id.to_string()],
                row_to_reference,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Outgoing edges of a model.
    pub fn list_references(&self, model_id: Uuid) -> Result<Vec<Reference>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, parent_model_id, target_model_id, created_at
             FROM model_references
             WHERE parent_model_id = ?1
             ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map(params![model_id.to_string()], row_to_reference)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    // Reference fields bound to this edge fall back to reference_id = NULL
    // and keep returning raw entry ids.
    pub fn delete_reference(&self, id: Uuid) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM model_references WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(affected > 0)
    }
}

fn row_to_reference(row: &rusqlite::Row<'_>) -> rusqlite::Result<Reference> {
    Ok(Reference {
        id: uuid_at(row, 0)?,
        parent_model_id: uuid_at(row, 1)?,
        target_model_id: uuid_at(row, 2)?,
        created_at: timestamp_at(row, 3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_are_directed() {
        let db = Database::open_in_memory().unwrap();
        let app = db.create_app("Website", "website").unwrap();
        let post = db.create_model(app.id, "Post", "post").unwrap();
        let author = db.create_model(app.id, "Author", "author").unwrap();

        let edge = db.create_reference(post.id, author.id).unwrap();

        assert_eq!(db.list_references(post.id).unwrap(), vec![edge]);
        assert!(db.list_references(author.id).unwrap().is_empty());
    }

    #[test]
    fn duplicate_edge_conflicts() {
        let db = Database::open_in_memory().unwrap();
        let app = db.create_app("Website", "website").unwrap();
        let post = db.create_model(app.id, "Post", "post").unwrap();

        db.create_reference(post.id, post.id).unwrap();
        assert!(matches!(
            db.create_reference(post.id, post.id),
            Err(StoreError::Conflict(_))
        ));
    }

    #[test]
    fn deleting_target_model_drops_edge() {
        let db = Database::open_in_memory().unwrap();
        let app = db.create_app("Website", "website").unwrap();
        let post = db.create_model(app.id, "Post", "post").unwrap();
        let author = db.create_model(app.id, "Author", "author").unwrap();
        let edge = db.create_reference(post.id, author.id).unwrap();

        db.delete_model(author.id).unwrap();
        assert!(matches!(db.get_reference(edge.id), Err(StoreError::NotFound)));
    }
}
