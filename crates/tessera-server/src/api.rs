use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::Method,
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tessera_shared::Entry;
use tessera_store::{Database, Declaration, QueryOptions};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::schema_api;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            config: Arc::new(config),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        // Read side
        .route("/health", get(health_check))
        .route("/info", get(server_info))
        .route("/declarations", get(list_declarations))
        .route("/translations/{locale}", get(translations))
        .route("/query", post(query))
        // Write side (admin token), except GET /content/{identifier}
        .route(
            "/content/{identifier}",
            get(get_content).put(schema_api::create_entry),
        )
        .route(
            "/content/{identifier}/{entry}",
            put(schema_api::update_entry).delete(schema_api::delete_entry),
        )
        .route("/apps", get(schema_api::list_apps).post(schema_api::create_app))
        .route("/apps/{id}", delete(schema_api::delete_app))
        .route(
            "/apps/{id}/models",
            get(schema_api::list_models).post(schema_api::create_model),
        )
        .route(
            "/apps/{id}/enumerations",
            get(schema_api::list_enumerations).post(schema_api::create_enumeration),
        )
        .route(
            "/models/{id}",
            patch(schema_api::rename_model).delete(schema_api::delete_model),
        )
        .route(
            "/models/{id}/fields",
            get(schema_api::list_fields).post(schema_api::create_field),
        )
        .route(
            "/models/{id}/references",
            get(schema_api::list_references).post(schema_api::create_reference),
        )
        .route(
            "/fields/{id}",
            patch(schema_api::update_field).delete(schema_api::delete_field),
        )
        .route(
            "/enumerations/{id}",
            put(schema_api::set_enumeration_values).delete(schema_api::delete_enumeration),
        )
        .route("/references/{id}", delete(schema_api::delete_reference))
        .route("/maintenance/purge-orphans", post(schema_api::purge_orphans))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Run a store call on the blocking pool with the shared connection.
pub(crate) async fn with_db<T, F>(state: &AppState, f: F) -> Result<T, ServerError>
where
    T: Send + 'static,
    F: FnOnce(&mut Database) -> tessera_store::Result<T> + Send + 'static,
{
    let db = Arc::clone(&state.db);
    tokio::task::spawn_blocking(move || {
        let mut guard = db
            .lock()
            .map_err(|_| ServerError::Internal("database lock poisoned".into()))?;
        f(&mut *guard).map_err(ServerError::from)
    })
    .await
    .map_err(|e| ServerError::Internal(format!("blocking task failed: {e}")))?
}

// ─── Responses ───

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServerInfoResponse {
    pub name: String,
    pub version: String,
    pub admin_enabled: bool,
    pub max_reference_depth: usize,
}

/// Content query payload.  Entries are flat objects keyed by field
/// identifier, plus `id`.
#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    pub data: Vec<Entry>,
}

// ─── Read side ───

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn server_info(State(state): State<AppState>) -> Json<ServerInfoResponse> {
    Json(ServerInfoResponse {
        name: state.config.instance_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        admin_enabled: state.config.admin_token.is_some(),
        max_reference_depth: state.config.max_reference_depth,
    })
}

async fn list_declarations(
    State(state): State<AppState>,
) -> Result<Json<Vec<Declaration>>, ServerError> {
    let declarations = with_db(&state, |db| db.list_declarations()).await?;
    Ok(Json(declarations))
}

async fn translations(
    State(state): State<AppState>,
    Path(locale): Path<String>,
) -> Result<Json<std::collections::BTreeMap<String, String>>, ServerError> {
    let strings = with_db(&state, move |db| db.translations_for(&locale)).await?;
    Ok(Json(strings))
}

/// `POST /query` body.  `params` is free-form; unrecognized keys are ignored.
#[derive(Debug, Serialize, Deserialize)]
pub struct QueryRequest {
    pub model: String,
    #[serde(default)]
    pub params: Map<String, JsonValue>,
}

async fn query(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ServerError> {
    let (options, timeout) = options_from_params(&req.params, &state.config)?;
    run_query(&state, req.model, options, timeout).await
}

/// Query-string form of the `POST /query` params.
#[derive(Debug, Default, Deserialize)]
pub struct ContentParams {
    pub depth: Option<usize>,
    pub sort_by: Option<String>,
    pub descending: Option<bool>,
    pub timeout_ms: Option<u64>,
}

async fn get_content(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
    Query(params): Query<ContentParams>,
) -> Result<Json<QueryResponse>, ServerError> {
    let options = QueryOptions {
        depth: params
            .depth
            .unwrap_or(0)
            .min(state.config.max_reference_depth),
        sort_by: params.sort_by,
        descending: params.descending.unwrap_or(false),
    };
    let timeout = match params.timeout_ms {
        None => state.config.query_timeout,
        Some(0) => {
            return Err(ServerError::BadRequest(
                "timeout_ms must be a positive integer".into(),
            ))
        }
        Some(ms) => Duration::from_millis(ms),
    };
    run_query(&state, identifier, options, timeout).await
}

/// Read the recognized keys out of free-form query params.
fn options_from_params(
    params: &Map<String, JsonValue>,
    config: &ServerConfig,
) -> Result<(QueryOptions, Duration), ServerError> {
    let mut options = QueryOptions::default();
    let mut timeout = config.query_timeout;

    if let Some(depth) = params.get("depth") {
        let depth = depth
            .as_u64()
            .ok_or_else(|| ServerError::BadRequest("depth must be a non-negative integer".into()))?;
        options.depth = usize::try_from(depth)
            .unwrap_or(usize::MAX)
            .min(config.max_reference_depth);
    }
    match params.get("sort_by") {
        None | Some(JsonValue::Null) => {}
        Some(JsonValue::String(key)) => options.sort_by = Some(key.clone()),
        Some(_) => return Err(ServerError::BadRequest("sort_by must be a string".into())),
    }
    if let Some(descending) = params.get("descending") {
        options.descending = descending
            .as_bool()
            .ok_or_else(|| ServerError::BadRequest("descending must be a boolean".into()))?;
    }
    if let Some(ms) = params.get("timeout_ms") {
        let ms = ms
            .as_u64()
            .filter(|ms| *ms > 0)
            .ok_or_else(|| ServerError::BadRequest("timeout_ms must be a positive integer".into()))?;
        timeout = Duration::from_millis(ms);
    }

    Ok((options, timeout))
}

/// Reconstruct a model's entries within `timeout`.  A query that runs out
/// of time answers with no entries.
async fn run_query(
    state: &AppState,
    model: String,
    options: QueryOptions,
    timeout: Duration,
) -> Result<Json<QueryResponse>, ServerError> {
    let identifier = model.clone();
    let task = with_db(state, move |db| db.query_entries(&model, &options));

    match tokio::time::timeout(timeout, task).await {
        Ok(result) => Ok(Json(QueryResponse { data: result? })),
        Err(_) => {
            tracing::debug!(
                model = %identifier,
                timeout_ms = timeout.as_millis() as u64,
                "query timed out, returning empty result"
            );
            Ok(Json(QueryResponse { data: Vec::new() }))
        }
    }
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
