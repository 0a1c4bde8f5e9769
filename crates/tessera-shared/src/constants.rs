/// Application name
pub const APP_NAME: &str = "Tessera";

/// Field identifier reserved for the entry id in reconstructed entries.
pub const RESERVED_ENTRY_KEY: &str = "id";

/// Maximum length of an app, model, field or enumeration identifier.
pub const MAX_IDENTIFIER_LEN: usize = 64;

/// Default HTTP API port
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Default bound on a single content query, in milliseconds.
pub const DEFAULT_QUERY_TIMEOUT_MS: u64 = 5_000;

/// Default (and maximum accepted) depth for following Reference fields.
pub const DEFAULT_MAX_REFERENCE_DEPTH: usize = 3;

/// Username of the administrative identity created on first start.
pub const DEFAULT_ROOT_USERNAME: &str = "root";

/// How long a connection waits on a locked database file (seeding races,
/// concurrent writers) before giving up.
pub const BUSY_TIMEOUT_SECS: u64 = 5;
