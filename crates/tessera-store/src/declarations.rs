//! Read access to the [`Declaration`] catalog.
//!
//! Declarations are written once by the bootstrap seeder; there is no public
//! create or delete.

use rusqlite::{params, OptionalExtension};
use tessera_shared::DeclarationKind;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Declaration;
use crate::rows::{kind_at, uuid_at};

impl Database {
    /// All declarations in catalog order.
    pub fn list_declarations(&self) -> Result<Vec<Declaration>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT id, kind, name, icon, color FROM declarations")?;
        let rows = stmt.query_map([], row_to_declaration)?;
        let mut declarations = rows
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)?;
        declarations.sort_by_key(|d| d.kind);
        Ok(declarations)
    }

    pub fn get_declaration(&self, id: Uuid) -> Result<Declaration> {
        self.conn()
            .query_row(
                "SELECT id, kind, name, icon, color FROM declarations WHERE id = ?1",
                params![id.to_string()],
                row_to_declaration,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Look up the seeded declaration for a kind.  `None` before seeding.
    pub fn declaration_for_kind(&self, kind: DeclarationKind) -> Result<Option<Declaration>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT id, kind, name, icon, color FROM declarations WHERE kind = ?1",
                params![kind.as_str()],
                row_to_declaration,
            )
            .optional()?)
    }

    pub fn count_declarations(&self) -> Result<u64> {
        let n: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM declarations", [], |row| row.get(0))?;
        Ok(n as u64)
    }
}

fn row_to_declaration(row: &rusqlite::Row<'_>) -> rusqlite::Result<Declaration> {
    Ok(Declaration {
        id: uuid_at(row, 0)?,
        kind: kind_at(row, 1)?,
        name: row.get(2)?,
        icon: row.get(3)?,
        color: row.get(4)?,
    })
}
