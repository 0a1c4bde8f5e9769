//! Integration tests for the Tessera HTTP API.
//!
//! Uses axum-test to drive the router against an in-memory database without
//! binding a socket.

use axum::http::{header::AUTHORIZATION, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use tessera_server::api::{build_router, AppState, HealthResponse};
use tessera_server::config::ServerConfig;
use tessera_store::{Database, RootUser};

const TOKEN: &str = "test-admin-token";

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn seeded_state(admin_token: Option<&str>) -> AppState {
    let mut db = Database::open_in_memory().unwrap();
    db.bootstrap(&RootUser::default()).unwrap();
    let config = ServerConfig {
        admin_token: admin_token.map(String::from),
        ..ServerConfig::default()
    };
    AppState::new(db, config)
}

fn create_test_server() -> TestServer {
    TestServer::new(build_router(seeded_state(Some(TOKEN)))).unwrap()
}

fn bearer() -> HeaderValue {
    format!("Bearer {TOKEN}").parse::<HeaderValue>().unwrap()
}

async fn admin_post(server: &TestServer, path: &str, body: Value) -> Value {
    let response = server
        .post(path)
        .add_header(AUTHORIZATION, bearer())
        .json(&body)
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()
}

async fn admin_put(server: &TestServer, path: &str, body: Value) -> Value {
    let response = server
        .put(path)
        .add_header(AUTHORIZATION, bearer())
        .json(&body)
        .await;
    response.assert_status_ok();
    response.json::<Value>()
}

async fn query(server: &TestServer, model: &str, params: Value) -> Vec<Value> {
    let response = server
        .post("/query")
        .json(&json!({ "model": model, "params": params }))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    body["data"].as_array().unwrap().clone()
}

fn id_of(record: &Value) -> String {
    record["id"].as_str().unwrap().to_string()
}

/// App `website` with model `article { title: string, body: text }`.
/// Returns `(app_id, model_id, body_field_id)`.
async fn article_schema(server: &TestServer) -> (String, String, String) {
    let app = admin_post(server, "/apps", json!({ "name": "Website", "identifier": "website" })).await;
    let app_id = id_of(&app);
    let model = admin_post(
        server,
        &format!("/apps/{app_id}/models"),
        json!({ "model_name": "Article", "identifier": "article" }),
    )
    .await;
    let model_id = id_of(&model);
    admin_post(
        server,
        &format!("/models/{model_id}/fields"),
        json!({ "identifier": "title", "declaration": "string", "position": 0 }),
    )
    .await;
    let body = admin_post(
        server,
        &format!("/models/{model_id}/fields"),
        json!({ "identifier": "body", "declaration": "text", "position": 1 }),
    )
    .await;
    (app_id, model_id, id_of(&body))
}

// =============================================================================
// HEALTH & CATALOG
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_declarations_are_seeded() {
    let server = create_test_server();

    let response = server.get("/declarations").await;

    response.assert_status_ok();
    let kinds: Vec<String> = response
        .json::<Vec<Value>>()
        .iter()
        .map(|d| d["kind"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        kinds,
        ["string", "text", "dropdown", "integer", "float", "boolean", "reference"]
    );
}

#[tokio::test]
async fn test_translations_by_locale() {
    let server = create_test_server();

    let fr = server.get("/translations/fr").await.json::<Value>();
    assert_eq!(fr["schema.field_required"], "Obligatoire");

    let unknown = server.get("/translations/xx").await.json::<Value>();
    assert_eq!(unknown, json!({}));
}

// =============================================================================
// SOFT MISSES
// =============================================================================

#[tokio::test]
async fn test_unknown_model_is_empty() {
    let server = create_test_server();

    assert!(query(&server, "nope", json!({})).await.is_empty());

    let response = server.get("/content/nope").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "data": [] }));
}

#[tokio::test]
async fn test_model_without_fields_is_empty() {
    let server = create_test_server();
    let app = admin_post(&server, "/apps", json!({ "name": "Site", "identifier": "site" })).await;
    admin_post(
        &server,
        &format!("/apps/{}/models", id_of(&app)),
        json!({ "model_name": "Empty", "identifier": "empty" }),
    )
    .await;

    assert!(query(&server, "empty", json!({})).await.is_empty());
}

#[tokio::test]
async fn test_query_timeout_returns_empty() {
    let state = seeded_state(Some(TOKEN));
    let server = TestServer::new(build_router(state.clone())).unwrap();
    article_schema(&server).await;
    admin_put(&server, "/content/article/1", json!({ "title": "Hi" })).await;

    // Hold the connection so the query cannot finish in time.
    let guard = state.db.lock().unwrap();
    let data = query(&server, "article", json!({ "timeout_ms": 50 })).await;
    drop(guard);

    assert!(data.is_empty());
    assert_eq!(query(&server, "article", json!({})).await.len(), 1);
}

// =============================================================================
// RECONSTRUCTION
// =============================================================================

#[tokio::test]
async fn test_entries_round_trip_through_the_value_store() {
    let server = create_test_server();
    article_schema(&server).await;

    admin_put(&server, "/content/article/1", json!({ "title": "Hi", "body": "World" })).await;
    admin_put(&server, "/content/article/2", json!({ "title": "Bye" })).await;

    let data = query(&server, "article", json!({ "sort_by": "id" })).await;
    assert_eq!(
        data,
        vec![
            json!({ "id": 1, "title": "Hi", "body": "World" }),
            json!({ "id": 2, "title": "Bye" }),
        ]
    );
}

#[tokio::test]
async fn test_new_entries_get_fresh_ids() {
    let server = create_test_server();
    article_schema(&server).await;

    let first = admin_put(&server, "/content/article", json!({ "title": "One" })).await;
    let second = admin_put(&server, "/content/article", json!({ "title": "Two" })).await;
    assert_eq!(first, json!({ "id": 1 }));
    assert_eq!(second, json!({ "id": 2 }));

    let response = server
        .get("/content/article")
        .add_query_param("sort_by", "title")
        .add_query_param("descending", "true")
        .await;
    response.assert_status_ok();
    let titles: Vec<Value> = response.json::<Value>()["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["title"].clone())
        .collect();
    assert_eq!(titles, vec![json!("Two"), json!("One")]);
}

#[tokio::test]
async fn test_typed_values() {
    let server = create_test_server();
    let app = admin_post(&server, "/apps", json!({ "name": "Shop", "identifier": "shop" })).await;
    let model = admin_post(
        &server,
        &format!("/apps/{}/models", id_of(&app)),
        json!({ "model_name": "Product", "identifier": "product" }),
    )
    .await;
    let fields = format!("/models/{}/fields", id_of(&model));
    admin_post(&server, &fields, json!({ "identifier": "stock", "declaration": "integer" })).await;
    admin_post(&server, &fields, json!({ "identifier": "price", "declaration": "float" })).await;
    admin_post(&server, &fields, json!({ "identifier": "active", "declaration": "boolean" })).await;

    admin_put(
        &server,
        "/content/product/1",
        json!({ "stock": 12, "price": "9.5", "active": true }),
    )
    .await;

    let data = query(&server, "product", json!({})).await;
    assert_eq!(data, vec![json!({ "id": 1, "stock": 12, "price": 9.5, "active": true })]);
}

#[tokio::test]
async fn test_deleted_field_leaves_siblings() {
    let server = create_test_server();
    let (_, _, body_field) = article_schema(&server).await;
    admin_put(&server, "/content/article/1", json!({ "title": "Hi", "body": "World" })).await;

    server
        .delete(&format!("/fields/{body_field}"))
        .add_header(AUTHORIZATION, bearer())
        .await
        .assert_status_ok();

    let data = query(&server, "article", json!({})).await;
    assert_eq!(data, vec![json!({ "id": 1, "title": "Hi" })]);

    let purge = server
        .post("/maintenance/purge-orphans")
        .add_header(AUTHORIZATION, bearer())
        .await;
    purge.assert_status_ok();
    assert_eq!(purge.json::<Value>(), json!({ "removed": 1 }));
}

#[tokio::test]
async fn test_delete_entry() {
    let server = create_test_server();
    article_schema(&server).await;
    admin_put(&server, "/content/article/1", json!({ "title": "Hi" })).await;

    server
        .delete("/content/article/1")
        .add_header(AUTHORIZATION, bearer())
        .await
        .assert_status_ok();
    assert!(query(&server, "article", json!({})).await.is_empty());

    server
        .delete("/content/article/1")
        .add_header(AUTHORIZATION, bearer())
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

// =============================================================================
// REFERENCES
// =============================================================================

#[tokio::test]
async fn test_reference_depth() {
    let server = create_test_server();
    let app = admin_post(&server, "/apps", json!({ "name": "Blog", "identifier": "blog" })).await;
    let app_id = id_of(&app);
    let author = admin_post(
        &server,
        &format!("/apps/{app_id}/models"),
        json!({ "model_name": "Author", "identifier": "author" }),
    )
    .await;
    let post = admin_post(
        &server,
        &format!("/apps/{app_id}/models"),
        json!({ "model_name": "Post", "identifier": "post" }),
    )
    .await;
    let edge = admin_post(
        &server,
        &format!("/models/{}/references", id_of(&post)),
        json!({ "target_model_id": id_of(&author) }),
    )
    .await;

    admin_post(
        &server,
        &format!("/models/{}/fields", id_of(&author)),
        json!({ "identifier": "name", "declaration": "string" }),
    )
    .await;
    let post_fields = format!("/models/{}/fields", id_of(&post));
    admin_post(&server, &post_fields, json!({ "identifier": "title", "declaration": "string" })).await;
    admin_post(
        &server,
        &post_fields,
        json!({ "identifier": "author", "declaration": "reference", "reference_id": id_of(&edge) }),
    )
    .await;

    admin_put(&server, "/content/author/1", json!({ "name": "Ada" })).await;
    admin_put(&server, "/content/post/1", json!({ "title": "Hello", "author": 1 })).await;
    admin_put(&server, "/content/post/2", json!({ "title": "Lost", "author": 9 })).await;

    let flat = query(&server, "post", json!({ "sort_by": "id" })).await;
    assert_eq!(flat[0]["author"], json!(1));

    let nested = query(&server, "post", json!({ "depth": 1, "sort_by": "id" })).await;
    assert_eq!(nested[0]["author"], json!({ "id": 1, "name": "Ada" }));
    assert_eq!(nested[1]["author"], json!(9));
}

#[tokio::test]
async fn test_self_reference_terminates() {
    let server = create_test_server();
    let app = admin_post(&server, "/apps", json!({ "name": "Docs", "identifier": "docs" })).await;
    let page = admin_post(
        &server,
        &format!("/apps/{}/models", id_of(&app)),
        json!({ "model_name": "Page", "identifier": "page" }),
    )
    .await;
    let edge = admin_post(
        &server,
        &format!("/models/{}/references", id_of(&page)),
        json!({ "target_model_id": id_of(&page) }),
    )
    .await;
    let fields = format!("/models/{}/fields", id_of(&page));
    admin_post(&server, &fields, json!({ "identifier": "slug", "declaration": "string" })).await;
    admin_post(
        &server,
        &fields,
        json!({ "identifier": "parent", "declaration": "reference", "reference_id": id_of(&edge) }),
    )
    .await;

    admin_put(&server, "/content/page/1", json!({ "slug": "home", "parent": 2 })).await;
    admin_put(&server, "/content/page/2", json!({ "slug": "about", "parent": 1 })).await;

    let data = query(&server, "page", json!({ "depth": 3, "sort_by": "id" })).await;
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["parent"], json!(2));
}

// =============================================================================
// VALIDATION
// =============================================================================

#[tokio::test]
async fn test_unknown_attribute_rejected() {
    let server = create_test_server();
    article_schema(&server).await;

    let response = server
        .put("/content/article/1")
        .add_header(AUTHORIZATION, bearer())
        .json(&json!({ "subtitle": "x" }))
        .await;
    response.assert_status_bad_request();
    let body = response.json::<Value>();
    assert!(body["error"].as_str().unwrap().contains("subtitle"));

    let response = server
        .post("/query")
        .json(&json!({ "model": "article", "params": { "sort_by": "subtitle" } }))
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_duplicate_identifier_conflicts() {
    let server = create_test_server();
    article_schema(&server).await;

    let response = server
        .post("/apps")
        .add_header(AUTHORIZATION, bearer())
        .json(&json!({ "name": "Again", "identifier": "website" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_reserved_field_identifier() {
    let server = create_test_server();
    let (_, model_id, _) = article_schema(&server).await;

    let response = server
        .post(&format!("/models/{model_id}/fields"))
        .add_header(AUTHORIZATION, bearer())
        .json(&json!({ "identifier": "id", "declaration": "integer" }))
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_empty_entry_save_rejected() {
    let server = create_test_server();
    article_schema(&server).await;

    for path in ["/content/article", "/content/article/5"] {
        let response = server
            .put(path)
            .add_header(AUTHORIZATION, bearer())
            .json(&json!({}))
            .await;
        response.assert_status_bad_request();
    }

    let first = admin_put(&server, "/content/article", json!({ "title": "One" })).await;
    assert_eq!(first, json!({ "id": 1 }));
    assert_eq!(query(&server, "article", json!({})).await.len(), 1);
}

#[tokio::test]
async fn test_zero_timeout_rejected_on_both_read_paths() {
    let server = create_test_server();
    article_schema(&server).await;

    server
        .get("/content/article")
        .add_query_param("timeout_ms", "0")
        .await
        .assert_status_bad_request();

    server
        .post("/query")
        .json(&json!({ "model": "article", "params": { "timeout_ms": 0 } }))
        .await
        .assert_status_bad_request();
}

// =============================================================================
// STORAGE FAILURES
// =============================================================================

#[tokio::test]
async fn test_storage_failure_is_an_error_not_an_empty_result() {
    let state = seeded_state(Some(TOKEN));
    let server = TestServer::new(build_router(state.clone())).unwrap();
    article_schema(&server).await;
    admin_put(&server, "/content/article/1", json!({ "title": "Hi" })).await;

    state
        .db
        .lock()
        .unwrap()
        .conn()
        .execute_batch("DROP TABLE entry_values")
        .unwrap();

    let response = server
        .post("/query")
        .json(&json!({ "model": "article", "params": {} }))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>(), json!({ "error": "Internal server error" }));

    server
        .get("/content/article")
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
}

// =============================================================================
// AUTHENTICATION
// =============================================================================

#[tokio::test]
async fn test_writes_disabled_without_configured_token() {
    let server = TestServer::new(build_router(seeded_state(None))).unwrap();

    let response = server
        .post("/apps")
        .add_header(AUTHORIZATION, bearer())
        .json(&json!({ "name": "Website", "identifier": "website" }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    let body = response.json::<Value>();
    assert!(body["error"].as_str().unwrap().contains("disabled"));
}

#[tokio::test]
async fn test_wrong_or_missing_token_forbidden() {
    let server = create_test_server();

    server
        .get("/apps")
        .await
        .assert_status(StatusCode::FORBIDDEN);
    server
        .get("/apps")
        .add_header(AUTHORIZATION, "Bearer wrong".parse::<HeaderValue>().unwrap())
        .await
        .assert_status(StatusCode::FORBIDDEN);
    server
        .put("/content/article/1")
        .json(&json!({ "title": "Hi" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_reads_need_no_token() {
    let server = create_test_server();
    article_schema(&server).await;

    server.get("/content/article").await.assert_status_ok();
    server.get("/declarations").await.assert_status_ok();
}
