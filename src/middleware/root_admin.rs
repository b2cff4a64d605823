use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use serde_json::Value;

use crate::compliance::audit::value_as_id;
use crate::error::ApiError;
use crate::middleware::body::{buffer_response, json_body, rebuild_response, rewrite_response};
use crate::middleware::route::ApiRoute;
use crate::state::AppState;

/// Adds `is_root_admin` to a successful admin login response.
/// The flag is read from storage for the admin whose `id` the response carries.
pub async fn root_admin_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let is_session_login = request.method() == Method::POST
        && ApiRoute::from_uri(request.uri())
            .map(|route| {
                route.service == state.settings.system_service && route.resource_path() == "admin/session"
            })
            .unwrap_or(false);

    let response = next.run(request).await;
    if !is_session_login || !response.status().is_success() {
        return Ok(response);
    }

    let (parts, bytes) = buffer_response(response, state.settings.max_body_bytes).await?;
    let Some(Value::Object(mut body)) = json_body(&bytes) else {
        return Ok(rebuild_response(parts, bytes));
    };

    let is_root = match body.get("id").and_then(value_as_id) {
        Some(id) => state.stores.admins.is_root_by_id(id).await?,
        None => false,
    };
    body.insert("is_root_admin".to_string(), Value::Bool(is_root));

    rewrite_response(parts, &Value::Object(body))
}
