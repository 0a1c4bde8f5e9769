//! First-run initialization.
//!
//! Three steps, always in this order: declarations, root user, default
//! translations.  Each step checks its table and only writes when it is
//! empty.  The check and the insert share one `IMMEDIATE` transaction, so
//! the database write lock is held across both: a second process starting
//! against the same file blocks (up to the busy timeout), then sees the rows
//! and does nothing.  Inserts are additionally `OR IGNORE` against unique
//! keys.

use chrono::Utc;
use rusqlite::{params, Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use tessera_shared::constants::DEFAULT_ROOT_USERNAME;
use tessera_shared::DeclarationKind;
use uuid::Uuid;

use crate::database::Database;
use crate::error::Result;

/// Identity created when the `users` table is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootUser {
    pub username: String,
    pub display_name: Option<String>,
}

impl Default for RootUser {
    fn default() -> Self {
        Self {
            username: DEFAULT_ROOT_USERNAME.to_string(),
            display_name: Some("Administrator".to_string()),
        }
    }
}

/// Rows written by one [`Database::bootstrap`] run.  All zero on every run
/// after the first.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeedReport {
    pub declarations: usize,
    pub root_user: usize,
    pub translations: usize,
}

/// `(locale, key, text)` rows written on first start.
pub const DEFAULT_TRANSLATIONS: &[(&str, &str, &str)] = &[
    ("en", "content.empty", "No entries yet"),
    ("en", "content.new_entry", "New entry"),
    ("en", "schema.new_model", "New content type"),
    ("en", "schema.new_field", "Add field"),
    ("en", "schema.field_required", "Required"),
    ("fr", "content.empty", "Aucune entrée pour le moment"),
    ("fr", "content.new_entry", "Nouvelle entrée"),
    ("fr", "schema.new_model", "Nouveau type de contenu"),
    ("fr", "schema.new_field", "Ajouter un champ"),
    ("fr", "schema.field_required", "Obligatoire"),
];

impl Database {
    /// Run every seeding step.  Safe to call on each start.
    pub fn bootstrap(&mut self, root: &RootUser) -> Result<SeedReport> {
        let report = SeedReport {
            declarations: self.seed_step("declarations", seed_declarations)?,
            root_user: self.seed_step("users", |tx| seed_root_user(tx, root))?,
            translations: self.seed_step("translations", seed_translations)?,
        };

        if report == SeedReport::default() {
            tracing::debug!("bootstrap: nothing to seed");
        } else {
            tracing::info!(
                declarations = report.declarations,
                root_user = report.root_user,
                translations = report.translations,
                "bootstrap seeded initial data"
            );
        }
        Ok(report)
    }

    /// Run `insert` under the write lock if `table` is empty.
    fn seed_step<F>(&mut self, table: &'static str, insert: F) -> Result<usize>
    where
        F: FnOnce(&Transaction<'_>) -> rusqlite::Result<usize>,
    {
        let tx = self
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let count: i64 = tx.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get(0)
        })?;
        if count > 0 {
            return Ok(0);
        }

        let inserted = insert(&tx)?;
        tx.commit()?;
        Ok(inserted)
    }
}

fn seed_declarations(tx: &Transaction<'_>) -> rusqlite::Result<usize> {
    let mut stmt = tx.prepare(
        "INSERT OR IGNORE INTO declarations (id, kind, name, icon, color)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    let mut inserted = 0;
    for kind in DeclarationKind::ALL {
        inserted += stmt.execute(params![
            Uuid::new_v4().to_string(),
            kind.as_str(),
            kind.display_name(),
            kind.icon(),
            kind.color(),
        ])?;
    }
    Ok(inserted)
}

fn seed_root_user(tx: &Transaction<'_>, root: &RootUser) -> rusqlite::Result<usize> {
    tx.execute(
        "INSERT OR IGNORE INTO users (id, username, display_name, role, created_at)
         VALUES (?1, ?2, ?3, 'admin', ?4)",
        params![
            Uuid::new_v4().to_string(),
            root.username,
            root.display_name,
            Utc::now().to_rfc3339(),
        ],
    )
}

fn seed_translations(tx: &Transaction<'_>) -> rusqlite::Result<usize> {
    let mut stmt = tx.prepare(
        "INSERT OR IGNORE INTO translations (id, locale, key, text)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    let mut inserted = 0;
    for (locale, key, text) in DEFAULT_TRANSLATIONS {
        inserted += stmt.execute(params![Uuid::new_v4().to_string(), locale, key, text])?;
    }
    Ok(inserted)
}
