//! CRUD operations for [`Field`] records.
//!
//! A field's owning model is fixed at creation: there is no operation that
//! rewrites `model_id`.

use chrono::Utc;
use rusqlite::params;
use tessera_shared::DeclarationKind;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{classify, Result, StoreError};
use crate::models::{Field, FieldPatch, Model, NewField};
use crate::rows::{bool_at, kind_at, opt_uuid_at, timestamp_at, uuid_at};
use crate::validation::validate_field_identifier;

const FIELD_SELECT: &str = "SELECT f.id, f.model_id, f.identifier, f.declaration_id, d.kind,
        f.position, f.default_value, f.is_required, f.is_unique, f.is_hide,
        f.is_system, f.is_primary_key, f.is_media, f.enumeration_id,
        f.reference_id, f.created_at
     FROM fields f
     JOIN declarations d ON d.id = f.declaration_id";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Add a field to a model.
    ///
    /// Dropdown fields must name an enumeration of the model's app; reference
    /// fields must name an outgoing reference of the model.
    pub fn create_field(&self, model_id: Uuid, new: &NewField) -> Result<Field> {
        validate_field_identifier(&new.identifier)?;
        let model = self.get_model(model_id)?;

        let kind = new
            .declaration
            .ok_or_else(|| StoreError::Invalid("field declaration is required".into()))?;
        let declaration = self.declaration_for_kind(kind)?.ok_or_else(|| {
            StoreError::Invalid(format!("declaration '{kind}' has not been seeded"))
        })?;

        self.check_field_links(&model, kind, new)?;

        let field = Field {
            id: Uuid::new_v4(),
            model_id,
            identifier: new.identifier.clone(),
            declaration_id: declaration.id,
            kind,
            position: new.position,
            default_value: new.default_value.clone(),
            is_required: new.is_required,
            is_unique: new.is_unique,
            is_hide: new.is_hide,
            is_system: new.is_system,
            is_primary_key: new.is_primary_key,
            is_media: new.is_media,
            enumeration_id: new.enumeration_id,
            reference_id: new.reference_id,
            created_at: Utc::now(),
        };

        self.conn()
            .execute(
                "INSERT INTO fields (id, model_id, identifier, declaration_id, position,
                     default_value, is_required, is_unique, is_hide, is_system,
                     is_primary_key, is_media, enumeration_id, reference_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                params![
                    field.id.to_string(),
                    field.model_id.to_string(),
                    field.identifier,
                    field.declaration_id.to_string(),
                    field.position,
                    field.default_value,
                    field.is_required,
                    field.is_unique,
                    field.is_hide,
                    field.is_system,
                    field.is_primary_key,
                    field.is_media,
                    field.enumeration_id.map(|id| id.to_string()),
                    field.reference_id.map(|id| id.to_string()),
                    field.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| {
                classify(
                    e,
                    &format!(
                        "model '{}' already has a field '{}'",
                        model.identifier, field.identifier
                    ),
                )
            })?;

        tracing::info!(
            model = %model.identifier,
            field = %field.identifier,
            kind = %kind,
            "field created"
        );
        Ok(field)
    }

    fn check_field_links(&self, model: &Model, kind: DeclarationKind, new: &NewField) -> Result<()> {
        match (kind, new.enumeration_id) {
            (DeclarationKind::Dropdown, Some(enumeration_id)) => {
                let enumeration = self.get_enumeration(enumeration_id)?;
                if enumeration.app_id != model.app_id {
                    return Err(StoreError::Invalid(
                        "enumeration belongs to another app".into(),
                    ));
                }
            }
            (DeclarationKind::Dropdown, None) => {
                return Err(StoreError::Invalid(
                    "dropdown fields require an enumeration".into(),
                ));
            }
            (_, Some(_)) => {
                return Err(StoreError::Invalid(
                    "only dropdown fields take an enumeration".into(),
                ));
            }
            (_, None) => {}
        }

        match (kind, new.reference_id) {
            (DeclarationKind::Reference, Some(reference_id)) => {
                let reference = self.get_reference(reference_id)?;
                if reference.parent_model_id != model.id {
                    return Err(StoreError::Invalid(
                        "reference does not start at this model".into(),
                    ));
                }
            }
            (DeclarationKind::Reference, None) => {
                return Err(StoreError::Invalid(
                    "reference fields require a reference".into(),
                ));
            }
            (_, Some(_)) => {
                return Err(StoreError::Invalid(
                    "only reference fields take a reference".into(),
                ));
            }
            (_, None) => {}
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_field(&self, id: Uuid) -> Result<Field> {
        let sql = format!("{FIELD_SELECT} WHERE f.id = ?1");
        self.conn()
            .query_row(&sql, params![id.to_string()], row_to_field)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Every field of a model, in presentation order.  One query; the
    /// declaration kind is joined in.
    pub fn list_fields(&self, model_id: Uuid) -> Result<Vec<Field>> {
        let sql = format!(
            "{FIELD_SELECT} WHERE f.model_id = ?1 ORDER BY f.position ASC, f.created_at ASC"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params![model_id.to_string()], row_to_field)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Apply a partial update.  Identity, owner and type are not patchable.
    pub fn update_field(&self, id: Uuid, patch: &FieldPatch) -> Result<Field> {
        let mut field = self.get_field(id)?;

        if let Some(position) = patch.position {
            field.position = position;
        }
        if patch.clear_default_value {
            field.default_value = None;
        } else if let Some(default_value) = &patch.default_value {
            field.default_value = Some(default_value.clone());
        }
        field.is_required = patch.is_required.unwrap_or(field.is_required);
        field.is_unique = patch.is_unique.unwrap_or(field.is_unique);
        field.is_hide = patch.is_hide.unwrap_or(field.is_hide);
        field.is_system = patch.is_system.unwrap_or(field.is_system);
        field.is_primary_key = patch.is_primary_key.unwrap_or(field.is_primary_key);
        field.is_media = patch.is_media.unwrap_or(field.is_media);

        self.conn().execute(
            "UPDATE fields
             SET position = ?1, default_value = ?2, is_required = ?3, is_unique = ?4,
                 is_hide = ?5, is_system = ?6, is_primary_key = ?7, is_media = ?8
             WHERE id = ?9",
            params![
                field.position,
                field.default_value,
                field.is_required,
                field.is_unique,
                field.is_hide,
                field.is_system,
                field.is_primary_key,
                field.is_media,
                field.id.to_string(),
            ],
        )?;

        Ok(field)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    // Values written against the field are left in place and become
    // orphans; see `purge_orphan_values`.
    pub fn delete_field(&self, id: Uuid) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM fields WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }
}

fn row_to_field(row: &rusqlite::Row<'_>) -> rusqlite::Result<Field> {
    Ok(Field {
        id: uuid_at(row, 0)?,
        model_id: uuid_at(row, 1)?,
        identifier: row.get(2)?,
        declaration_id: uuid_at(row, 3)?,
        kind: kind_at(row, 4)?,
        position: row.get(5)?,
        default_value: row.get(6)?,
        is_required: bool_at(row, 7)?,
        is_unique: bool_at(row, 8)?,
        is_hide: bool_at(row, 9)?,
        is_system: bool_at(row, 10)?,
        is_primary_key: bool_at(row, 11)?,
        is_media: bool_at(row, 12)?,
        enumeration_id: opt_uuid_at(row, 13)?,
        reference_id: opt_uuid_at(row, 14)?,
        created_at: timestamp_at(row, 15)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::RootUser;

    fn seeded() -> (Database, Model) {
        let mut db = Database::open_in_memory().unwrap();
        db.bootstrap(&RootUser::default()).unwrap();
        let app = db.create_app("Website", "website").unwrap();
        let model = db.create_model(app.id, "Article", "article").unwrap();
        (db, model)
    }

    #[test]
    fn fields_come_back_in_position_order() {
        let (db, article) = seeded();
        let mut body = NewField::new("body", DeclarationKind::Text);
        body.position = 2;
        let mut title = NewField::new("title", DeclarationKind::String);
        title.position = 1;
        title.is_required = true;

        db.create_field(article.id, &body).unwrap();
        db.create_field(article.id, &title).unwrap();

        let fields = db.list_fields(article.id).unwrap();
        let ids: Vec<_> = fields.iter().map(|f| f.identifier.as_str()).collect();
        assert_eq!(ids, vec!["title", "body"]);
        assert_eq!(fields[0].kind, DeclarationKind::String);
        assert!(fields[0].is_required);
    }

    #[test]
    fn identifiers_unique_per_model_only() {
        let (db, article) = seeded();
        let page = db.create_model(article.app_id, "Page", "page").unwrap();

        db.create_field(article.id, &NewField::new("title", DeclarationKind::String))
            .unwrap();
        db.create_field(page.id, &NewField::new("title", DeclarationKind::String))
            .unwrap();
        assert!(matches!(
            db.create_field(article.id, &NewField::new("title", DeclarationKind::Text)),
            Err(StoreError::Conflict(_))
        ));
    }

    #[test]
    fn reserved_identifier_rejected() {
        let (db, article) = seeded();
        assert!(matches!(
            db.create_field(article.id, &NewField::new("id", DeclarationKind::Integer)),
            Err(StoreError::Invalid(_))
        ));
    }

    #[test]
    fn unseeded_declarations_reject_fields() {
        let db = Database::open_in_memory().unwrap();
        let app = db.create_app("Website", "website").unwrap();
        let model = db.create_model(app.id, "Article", "article").unwrap();
        assert!(matches!(
            db.create_field(model.id, &NewField::new("title", DeclarationKind::String)),
            Err(StoreError::Invalid(_))
        ));
    }

    #[test]
    fn dropdown_needs_enumeration_of_same_app() {
        let (db, article) = seeded();
        let other = db.create_app("Other", "other").unwrap();
        let foreign = db
            .create_enumeration(other.id, "Status", "status", &["draft".to_string()])
            .unwrap();
        let local = db
            .create_enumeration(article.app_id, "Status", "status", &["draft".to_string()])
            .unwrap();

        let mut status = NewField::new("status", DeclarationKind::Dropdown);
        assert!(db.create_field(article.id, &status).is_err());

        status.enumeration_id = Some(foreign.id);
        assert!(matches!(
            db.create_field(article.id, &status),
            Err(StoreError::Invalid(_))
        ));

        status.enumeration_id = Some(local.id);
        let field = db.create_field(article.id, &status).unwrap();
        assert_eq!(field.enumeration_id, Some(local.id));
    }

    #[test]
    fn reference_field_must_use_outgoing_edge() {
        let (db, article) = seeded();
        let author = db.create_model(article.app_id, "Author", "author").unwrap();
        let backwards = db.create_reference(author.id, article.id).unwrap();
        let forwards = db.create_reference(article.id, author.id).unwrap();

        let mut by = NewField::new("author", DeclarationKind::Reference);
        by.reference_id = Some(backwards.id);
        assert!(matches!(
            db.create_field(article.id, &by),
            Err(StoreError::Invalid(_))
        ));

        by.reference_id = Some(forwards.id);
        assert!(db.create_field(article.id, &by).is_ok());
    }

    #[test]
    fn patch_leaves_owner_and_kind_alone() {
        let (db, article) = seeded();
        let mut new = NewField::new("title", DeclarationKind::String);
        new.default_value = Some("Untitled".into());
        let field = db.create_field(article.id, &new).unwrap();

        let patched = db
            .update_field(
                field.id,
                &FieldPatch {
                    position: Some(5),
                    is_hide: Some(true),
                    clear_default_value: true,
                    ..FieldPatch::default()
                },
            )
            .unwrap();

        assert_eq!(patched.position, 5);
        assert!(patched.is_hide);
        assert_eq!(patched.default_value, None);
        assert_eq!(patched.model_id, article.id);
        assert_eq!(patched.kind, DeclarationKind::String);
        assert_eq!(db.get_field(field.id).unwrap(), patched);
    }
}
