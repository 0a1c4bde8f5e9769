use tessera_store::{Database, RootUser};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tessera_server::api::{self, AppState};
use tessera_server::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tessera_server=debug,tessera_store=debug")),
        )
        .init();

    info!("Starting Tessera server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(
        instance = %config.instance_name,
        http_addr = %config.http_addr,
        admin_enabled = config.admin_token.is_some(),
        query_timeout_ms = config.query_timeout.as_millis() as u64,
        max_reference_depth = config.max_reference_depth,
        "Loaded configuration"
    );

    // -----------------------------------------------------------------------
    // 3. Open the database and seed first-run data
    // -----------------------------------------------------------------------
    let root = RootUser {
        username: config.root_username.clone(),
        ..RootUser::default()
    };
    let path = config.database_path.clone();
    let db = tokio::task::spawn_blocking(move || -> anyhow::Result<Database> {
        let mut db = match path {
            Some(path) => Database::open_at(&path)?,
            None => Database::new()?,
        };
        db.bootstrap(&root)?;
        Ok(db)
    })
    .await??;

    if let Some(path) = db.path() {
        info!(path = %path.display(), "Database ready");
    }

    let http_addr = config.http_addr;
    let app_state = AppState::new(db, config);

    // -----------------------------------------------------------------------
    // 4. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
