//! v001 -- Schema registry and value store.
//!
//! `entry_values.field_id` deliberately has no FOREIGN KEY: deleting a field
//! leaves its values behind as orphans, which readers skip.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Apps (tenants)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS apps (
    id         TEXT PRIMARY KEY NOT NULL,     -- UUID v4
    name       TEXT NOT NULL,
    identifier TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL                  -- RFC-3339
);

-- ----------------------------------------------------------------
-- Declarations (field types, seeded once)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS declarations (
    id    TEXT PRIMARY KEY NOT NULL,          -- UUID v4
    kind  TEXT NOT NULL UNIQUE,               -- string, text, dropdown, ...
    name  TEXT NOT NULL,
    icon  TEXT NOT NULL,
    color TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Models (content types)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS models (
    id         TEXT PRIMARY KEY NOT NULL,     -- UUID v4
    app_id     TEXT NOT NULL,                 -- FK -> apps(id)
    model_name TEXT NOT NULL,
    identifier TEXT NOT NULL UNIQUE,          -- global: resolves without an app
    created_at TEXT NOT NULL,

    FOREIGN KEY (app_id) REFERENCES apps(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_models_app_id ON models(app_id);

-- ----------------------------------------------------------------
-- Enumerations (dropdown option lists)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS enumerations (
    id               TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    app_id           TEXT NOT NULL,              -- FK -> apps(id)
    enumeration_name TEXT NOT NULL,
    identifier       TEXT NOT NULL,
    values_json      TEXT NOT NULL,              -- JSON array of strings
    created_at       TEXT NOT NULL,

    FOREIGN KEY (app_id) REFERENCES apps(id) ON DELETE CASCADE
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_enumerations_app_identifier
    ON enumerations(app_id, identifier);

-- ----------------------------------------------------------------
-- References (directed model -> model edges)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS model_references (
    id              TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    parent_model_id TEXT NOT NULL,              -- FK -> models(id)
    target_model_id TEXT NOT NULL,              -- FK -> models(id)
    created_at      TEXT NOT NULL,

    FOREIGN KEY (parent_model_id) REFERENCES models(id) ON DELETE CASCADE,
    FOREIGN KEY (target_model_id) REFERENCES models(id) ON DELETE CASCADE
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_model_references_edge
    ON model_references(parent_model_id, target_model_id);

-- ----------------------------------------------------------------
-- Fields (attribute definitions)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS fields (
    id             TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    model_id       TEXT NOT NULL,               -- FK -> models(id), immutable
    identifier     TEXT NOT NULL,
    declaration_id TEXT NOT NULL,               -- FK -> declarations(id)
    position       INTEGER NOT NULL DEFAULT 0,
    default_value  TEXT,
    is_required    INTEGER NOT NULL DEFAULT 0,  -- boolean 0/1
    is_unique      INTEGER NOT NULL DEFAULT 0,
    is_hide        INTEGER NOT NULL DEFAULT 0,
    is_system      INTEGER NOT NULL DEFAULT 0,
    is_primary_key INTEGER NOT NULL DEFAULT 0,
    is_media       INTEGER NOT NULL DEFAULT 0,
    enumeration_id TEXT,                        -- dropdown fields
    reference_id   TEXT,                        -- reference fields
    created_at     TEXT NOT NULL,

    FOREIGN KEY (model_id) REFERENCES models(id) ON DELETE CASCADE,
    FOREIGN KEY (declaration_id) REFERENCES declarations(id),
    FOREIGN KEY (enumeration_id) REFERENCES enumerations(id) ON DELETE SET NULL,
    FOREIGN KEY (reference_id) REFERENCES model_references(id) ON DELETE SET NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_fields_model_identifier
    ON fields(model_id, identifier);

-- ----------------------------------------------------------------
-- Values (one row per entry attribute)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS entry_values (
    id         TEXT PRIMARY KEY NOT NULL,     -- UUID v4
    entry      INTEGER NOT NULL,
    field_id   TEXT NOT NULL,                 -- field id, not enforced
    value      TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_entry_values_field ON entry_values(field_id);
CREATE UNIQUE INDEX IF NOT EXISTS idx_entry_values_entry_field
    ON entry_values(entry, field_id);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
