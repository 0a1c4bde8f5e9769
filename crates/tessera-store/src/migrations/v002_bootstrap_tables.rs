use rusqlite::Connection;

const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id           TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    username     TEXT NOT NULL UNIQUE,
    display_name TEXT,
    role         TEXT NOT NULL DEFAULT 'editor',
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS translations (
    id     TEXT PRIMARY KEY NOT NULL,         -- UUID v4
    locale TEXT NOT NULL,                     -- BCP-47 tag, e.g. "en"
    key    TEXT NOT NULL,
    text   TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_translations_locale_key
    ON translations(locale, key);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
