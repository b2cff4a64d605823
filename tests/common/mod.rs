#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::Path,
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use df_compliance::compliance::cache::LocalAuthCache;
use df_compliance::compliance::license::{LicenseTier, StaticLicense};
use df_compliance::compliance::session::SessionUser;
use df_compliance::compliance::store::Stores;
use df_compliance::config::AppConfig;
use df_compliance::database::models::AdminRecord;
use df_compliance::database::MemoryStore;
use df_compliance::AppState;

pub const ROOT_ID: i64 = 1;
pub const RESTRICTED_ID: i64 = 2;
pub const ROOT_EMAIL: &str = "root@example.com";
pub const RESTRICTED_EMAIL: &str = "ra@example.com";

/// A compliance-wrapped app over an in-memory platform
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

pub fn platform_store() -> Arc<MemoryStore> {
    Arc::new(
        MemoryStore::builder()
            .admin(AdminRecord::new(0, ROOT_EMAIL).root())
            .admin(AdminRecord::new(0, RESTRICTED_EMAIL))
            .service("system")
            .service("api_docs")
            .service("db")
            .service("files")
            .service("logs")
            .service("email")
            .app("admin")
            .app("api_docs")
            .app("file_manager")
            .build(),
    )
}

pub fn test_app() -> TestApp {
    test_app_with_license(LicenseTier::Gold)
}

pub fn test_app_with_license(license: LicenseTier) -> TestApp {
    let store = platform_store();
    let stores = Stores::from_backend(store.clone(), Arc::new(LocalAuthCache::new()), Arc::new(StaticLicense(license)));
    let state = AppState::new(stores, &AppConfig::development());
    let router = df_compliance::app(host_router(), state.clone());
    TestApp { router, state, store }
}

/// Stand-in for the host platform's own system endpoints
pub fn host_router() -> Router {
    Router::new()
        .route("/api/:version/system/admin", post(echo).put(echo).patch(echo))
        .route("/api/:version/system/admin/session", post(admin_login))
        .route("/api/:version/system/admin/:id", get(echo_id).put(echo).patch(echo))
        .route("/api/:version/system/role", get(role_list).delete(role_bulk_delete))
        .route("/api/:version/system/role/:id", get(role_show).delete(role_delete))
        .route(
            "/api/:version/system/service",
            post(service_write).put(service_write).patch(service_write).delete(service_bulk_delete),
        )
        .route(
            "/api/:version/system/service/:id",
            get(echo_id).put(service_write).patch(service_write).delete(service_delete),
        )
}

async fn echo(Json(body): Json<Value>) -> Json<Value> {
    Json(body)
}

async fn echo_id(Path((_version, id)): Path<(String, i64)>) -> Json<Value> {
    Json(json!({ "id": id }))
}

async fn admin_login(Json(body): Json<Value>) -> Response {
    if body.get("password").and_then(Value::as_str) == Some("wrong") {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Invalid credentials" }))).into_response();
    }
    Json(json!({
        "id": body.get("id").cloned().unwrap_or(Value::Null),
        "email": body.get("email").cloned().unwrap_or(Value::Null),
        "session_token": "token",
    }))
    .into_response()
}

async fn role_list() -> Json<Value> {
    Json(json!({ "resource": [] }))
}

async fn role_bulk_delete() -> Json<Value> {
    Json(json!({ "resource": [] }))
}

async fn role_show(Path((_version, id)): Path<(String, i64)>) -> Json<Value> {
    Json(json!({ "id": id, "name": format!("role {}", id) }))
}

async fn role_delete(Path((_version, id)): Path<(String, i64)>) -> Json<Value> {
    Json(json!({ "id": id }))
}

async fn service_write(Json(body): Json<Value>) -> Response {
    if body.get("fail").and_then(Value::as_bool) == Some(true) {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "rejected by host" }))).into_response();
    }
    Json(body).into_response()
}

async fn service_delete(Path((_version, id)): Path<(String, i64)>) -> Json<Value> {
    Json(json!({ "id": id }))
}

async fn service_bulk_delete() -> Json<Value> {
    Json(json!({ "resource": [] }))
}

pub fn root_user() -> SessionUser {
    SessionUser { id: ROOT_ID, email: ROOT_EMAIL.to_string(), is_sys_admin: true, role_id: None }
}

pub fn restricted_user(role_id: i64) -> SessionUser {
    SessionUser { id: RESTRICTED_ID, email: RESTRICTED_EMAIL.to_string(), is_sys_admin: true, role_id: Some(role_id) }
}

/// Build a request carrying `user` the way the host's auth layer would
pub fn request(method: Method, uri: &str, user: Option<SessionUser>, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let mut request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };
    if let Some(user) = user {
        request.extensions_mut().insert(user);
    }
    request
}

/// Send one request and decode the JSON response (Null for an empty body)
pub async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).expect("json body") };
    (status, body)
}

pub async fn send_json(app: &TestApp, method: Method, uri: &str, user: Option<SessionUser>, body: Value) -> (StatusCode, Value) {
    send(app, request(method, uri, user, Some(body))).await
}

pub async fn send_empty(app: &TestApp, method: Method, uri: &str, user: Option<SessionUser>) -> (StatusCode, Value) {
    send(app, request(method, uri, user, None)).await
}
