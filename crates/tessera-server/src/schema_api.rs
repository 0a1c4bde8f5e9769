//! Admin-gated handlers: schema management and content writes.
//!
//! Every handler checks the bearer token before touching the store.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tessera_shared::EntryId;
use tessera_store::{App, Enumeration, Field, FieldPatch, Model, NewField, Reference};
use tracing::info;
use uuid::Uuid;

use crate::api::{with_db, AppState};
use crate::auth::verify_admin_token;
use crate::error::ServerError;

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAppRequest {
    pub name: String,
    pub identifier: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateModelRequest {
    pub model_name: String,
    pub identifier: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RenameModelRequest {
    pub model_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateEnumerationRequest {
    pub enumeration_name: String,
    pub identifier: String,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnumerationValuesRequest {
    pub values: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateReferenceRequest {
    pub target_model_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SavedEntryResponse {
    pub id: EntryId,
}

type Deleted = Json<serde_json::Value>;

/// `true` becomes `{"deleted": true}`; `false` means there was nothing to
/// delete.
fn deleted(found: bool) -> Result<Deleted, ServerError> {
    if found {
        Ok(Json(serde_json::json!({ "deleted": true })))
    } else {
        Err(ServerError::NotFound("Record not found".into()))
    }
}

// ─── Apps ───

pub async fn create_app(
    headers: HeaderMap,
    State(state): State<AppState>,
    Json(req): Json<CreateAppRequest>,
) -> Result<(StatusCode, Json<App>), ServerError> {
    verify_admin_token(&headers, &state.config)?;
    let app = with_db(&state, move |db| db.create_app(&req.name, &req.identifier)).await?;
    info!(id = %app.id, identifier = %app.identifier, "App created via API");
    Ok((StatusCode::CREATED, Json(app)))
}

pub async fn list_apps(
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Json<Vec<App>>, ServerError> {
    verify_admin_token(&headers, &state.config)?;
    Ok(Json(with_db(&state, |db| db.list_apps()).await?))
}

pub async fn delete_app(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Deleted, ServerError> {
    verify_admin_token(&headers, &state.config)?;
    deleted(with_db(&state, move |db| db.delete_app(id)).await?)
}

// ─── Models ───

pub async fn create_model(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(app_id): Path<Uuid>,
    Json(req): Json<CreateModelRequest>,
) -> Result<(StatusCode, Json<Model>), ServerError> {
    verify_admin_token(&headers, &state.config)?;
    let model = with_db(&state, move |db| {
        db.create_model(app_id, &req.model_name, &req.identifier)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(model)))
}

pub async fn list_models(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(app_id): Path<Uuid>,
) -> Result<Json<Vec<Model>>, ServerError> {
    verify_admin_token(&headers, &state.config)?;
    let models = with_db(&state, move |db| {
        db.get_app(app_id)?;
        db.list_models(app_id)
    })
    .await?;
    Ok(Json(models))
}

pub async fn rename_model(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RenameModelRequest>,
) -> Result<Json<Model>, ServerError> {
    verify_admin_token(&headers, &state.config)?;
    Ok(Json(
        with_db(&state, move |db| db.rename_model(id, &req.model_name)).await?,
    ))
}

pub async fn delete_model(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Deleted, ServerError> {
    verify_admin_token(&headers, &state.config)?;
    deleted(with_db(&state, move |db| db.delete_model(id)).await?)
}

// ─── Fields ───

pub async fn create_field(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(model_id): Path<Uuid>,
    Json(new): Json<NewField>,
) -> Result<(StatusCode, Json<Field>), ServerError> {
    verify_admin_token(&headers, &state.config)?;
    let field = with_db(&state, move |db| db.create_field(model_id, &new)).await?;
    Ok((StatusCode::CREATED, Json(field)))
}

pub async fn list_fields(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(model_id): Path<Uuid>,
) -> Result<Json<Vec<Field>>, ServerError> {
    verify_admin_token(&headers, &state.config)?;
    let fields = with_db(&state, move |db| {
        db.get_model(model_id)?;
        db.list_fields(model_id)
    })
    .await?;
    Ok(Json(fields))
}

pub async fn update_field(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<FieldPatch>,
) -> Result<Json<Field>, ServerError> {
    verify_admin_token(&headers, &state.config)?;
    Ok(Json(
        with_db(&state, move |db| db.update_field(id, &patch)).await?,
    ))
}

pub async fn delete_field(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Deleted, ServerError> {
    verify_admin_token(&headers, &state.config)?;
    deleted(with_db(&state, move |db| db.delete_field(id)).await?)
}

// ─── Enumerations ───

pub async fn create_enumeration(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(app_id): Path<Uuid>,
    Json(req): Json<CreateEnumerationRequest>,
) -> Result<(StatusCode, Json<Enumeration>), ServerError> {
    verify_admin_token(&headers, &state.config)?;
    let enumeration = with_db(&state, move |db| {
        db.create_enumeration(app_id, &req.enumeration_name, &req.identifier, &req.values)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(enumeration)))
}

pub async fn list_enumerations(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(app_id): Path<Uuid>,
) -> Result<Json<Vec<Enumeration>>, ServerError> {
    verify_admin_token(&headers, &state.config)?;
    let enumerations = with_db(&state, move |db| {
        db.get_app(app_id)?;
        db.list_enumerations(app_id)
    })
    .await?;
    Ok(Json(enumerations))
}

pub async fn set_enumeration_values(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<EnumerationValuesRequest>,
) -> Result<Json<Enumeration>, ServerError> {
    verify_admin_token(&headers, &state.config)?;
    Ok(Json(
        with_db(&state, move |db| db.set_enumeration_values(id, &req.values)).await?,
    ))
}

pub async fn delete_enumeration(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Deleted, ServerError> {
    verify_admin_token(&headers, &state.config)?;
    deleted(with_db(&state, move |db| db.delete_enumeration(id)).await?)
}

// ─── References ───

pub async fn create_reference(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(parent_id): Path<Uuid>,
    Json(req): Json<CreateReferenceRequest>,
) -> Result<(StatusCode, Json<Reference>), ServerError> {
    verify_admin_token(&headers, &state.config)?;
    let reference = with_db(&state, move |db| {
        db.create_reference(parent_id, req.target_model_id)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(reference)))
}

pub async fn list_references(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(model_id): Path<Uuid>,
) -> Result<Json<Vec<Reference>>, ServerError> {
    verify_admin_token(&headers, &state.config)?;
    let references = with_db(&state, move |db| {
        db.get_model(model_id)?;
        db.list_references(model_id)
    })
    .await?;
    Ok(Json(references))
}

pub async fn delete_reference(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Deleted, ServerError> {
    verify_admin_token(&headers, &state.config)?;
    deleted(with_db(&state, move |db| db.delete_reference(id)).await?)
}

// ─── Content ───

/// Raw scalars for a save.  Strings pass through; numbers and booleans are
/// stored in their JSON text form.
fn raw_attributes(body: Map<String, JsonValue>) -> Result<BTreeMap<String, String>, ServerError> {
    body.into_iter()
        .map(|(identifier, value)| {
            let raw = match value {
                JsonValue::String(s) => s,
                JsonValue::Number(n) => n.to_string(),
                JsonValue::Bool(b) => b.to_string(),
                _ => {
                    return Err(ServerError::BadRequest(format!(
                        "attribute '{identifier}' must be a string, number or boolean"
                    )))
                }
            };
            Ok((identifier, raw))
        })
        .collect()
}

async fn save(
    state: &AppState,
    identifier: String,
    entry: Option<EntryId>,
    body: Map<String, JsonValue>,
) -> Result<Json<SavedEntryResponse>, ServerError> {
    let attributes = raw_attributes(body)?;
    let id = with_db(state, move |db| db.save_entry(&identifier, entry, &attributes)).await?;
    Ok(Json(SavedEntryResponse { id }))
}

pub async fn create_entry(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(identifier): Path<String>,
    Json(body): Json<Map<String, JsonValue>>,
) -> Result<Json<SavedEntryResponse>, ServerError> {
    verify_admin_token(&headers, &state.config)?;
    save(&state, identifier, None, body).await
}

pub async fn update_entry(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path((identifier, entry)): Path<(String, EntryId)>,
    Json(body): Json<Map<String, JsonValue>>,
) -> Result<Json<SavedEntryResponse>, ServerError> {
    verify_admin_token(&headers, &state.config)?;
    save(&state, identifier, Some(entry), body).await
}

pub async fn delete_entry(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path((identifier, entry)): Path<(String, EntryId)>,
) -> Result<Deleted, ServerError> {
    verify_admin_token(&headers, &state.config)?;
    let found = with_db(&state, move |db| {
        let model = db.get_model_by_identifier(&identifier)?;
        db.delete_entry(model.id, entry)
    })
    .await?;
    deleted(found)
}

// ─── Maintenance ───

pub async fn purge_orphans(
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ServerError> {
    verify_admin_token(&headers, &state.config)?;
    let removed = with_db(&state, |db| db.purge_orphan_values()).await?;
    Ok(Json(serde_json::json!({ "removed": removed })))
}
