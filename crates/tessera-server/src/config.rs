//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use tessera_shared::constants::{
    APP_NAME, DEFAULT_HTTP_PORT, DEFAULT_MAX_REFERENCE_DEPTH, DEFAULT_QUERY_TIMEOUT_MS,
    DEFAULT_ROOT_USERNAME,
};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: none (platform data directory).
    pub database_path: Option<PathBuf>,

    /// Human-readable name for this instance.
    /// Env: `INSTANCE_NAME`
    /// Default: `"Tessera"`
    pub instance_name: String,

    /// Admin API bearer token.  Required for every schema or content write.
    /// Env: `ADMIN_TOKEN`
    /// Default: empty (writes disabled).
    pub admin_token: Option<String>,

    /// Upper bound on a single content query.  A query still running when it
    /// expires answers with an empty result.
    /// Env: `QUERY_TIMEOUT_MS`
    /// Default: `5000`
    pub query_timeout: Duration,

    /// Largest reference depth a caller may ask for.
    /// Env: `MAX_REFERENCE_DEPTH`
    /// Default: `3`
    pub max_reference_depth: usize,

    /// Username of the administrative user created on first start.
    /// Env: `ROOT_USERNAME`
    /// Default: `root`
    pub root_username: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: None,
            instance_name: APP_NAME.to_string(),
            admin_token: None,
            query_timeout: Duration::from_millis(DEFAULT_QUERY_TIMEOUT_MS),
            max_reference_depth: DEFAULT_MAX_REFERENCE_DEPTH,
            root_username: DEFAULT_ROOT_USERNAME.to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`] over an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(path) = lookup("DATABASE_PATH") {
            if !path.is_empty() {
                config.database_path = Some(PathBuf::from(path));
            }
        }

        if let Some(name) = lookup("INSTANCE_NAME") {
            config.instance_name = name;
        }

        if let Some(token) = lookup("ADMIN_TOKEN") {
            if !token.is_empty() {
                config.admin_token = Some(token);
            }
        }

        if let Some(val) = lookup("QUERY_TIMEOUT_MS") {
            match val.parse::<u64>() {
                Ok(ms) if ms > 0 => config.query_timeout = Duration::from_millis(ms),
                _ => tracing::warn!(value = %val, "Invalid QUERY_TIMEOUT_MS, using default"),
            }
        }

        if let Some(val) = lookup("MAX_REFERENCE_DEPTH") {
            if let Ok(n) = val.parse::<usize>() {
                config.max_reference_depth = n;
            } else {
                tracing::warn!(value = %val, "Invalid MAX_REFERENCE_DEPTH, using default");
            }
        }

        if let Some(name) = lookup("ROOT_USERNAME") {
            if !name.trim().is_empty() {
                config.root_username = name.trim().to_string();
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert_eq!(config.query_timeout, Duration::from_millis(5_000));
        assert_eq!(config.max_reference_depth, 3);
        assert!(config.admin_token.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("HTTP_ADDR", "127.0.0.1:9000"),
            ("DATABASE_PATH", "/tmp/content.db"),
            ("ADMIN_TOKEN", "s3cret"),
            ("QUERY_TIMEOUT_MS", "250"),
            ("MAX_REFERENCE_DEPTH", "1"),
            ("ROOT_USERNAME", " admin "),
        ]));
        assert_eq!(config.http_addr, ([127, 0, 0, 1], 9000).into());
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/content.db")));
        assert_eq!(config.admin_token.as_deref(), Some("s3cret"));
        assert_eq!(config.query_timeout, Duration::from_millis(250));
        assert_eq!(config.max_reference_depth, 1);
        assert_eq!(config.root_username, "admin");
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("HTTP_ADDR", "not-an-address"),
            ("ADMIN_TOKEN", ""),
            ("QUERY_TIMEOUT_MS", "0"),
            ("MAX_REFERENCE_DEPTH", "-1"),
        ]));
        let defaults = ServerConfig::default();
        assert_eq!(config.http_addr, defaults.http_addr);
        assert!(config.admin_token.is_none());
        assert_eq!(config.query_timeout, defaults.query_timeout);
        assert_eq!(config.max_reference_depth, defaults.max_reference_depth);
    }
}
