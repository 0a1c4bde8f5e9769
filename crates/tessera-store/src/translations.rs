//! Default UI strings, keyed by `(locale, key)`.

use std::collections::BTreeMap;

use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};

impl Database {
    /// `key -> text` for one locale.  Empty for an unknown locale.
    pub fn translations_for(&self, locale: &str) -> Result<BTreeMap<String, String>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT key, text FROM translations WHERE locale = ?1")?;
        let rows = stmt.query_map(params![locale], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect::<std::result::Result<BTreeMap<_, _>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// Distinct locales with at least one string, sorted.
    pub fn list_locales(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT DISTINCT locale FROM translations ORDER BY locale ASC")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    pub fn count_translations(&self) -> Result<u64> {
        let n: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM translations", [], |row| row.get(0))?;
        Ok(n as u64)
    }
}
