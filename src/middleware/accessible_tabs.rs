use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use serde_json::{Map, Value};

use crate::compliance::audit::value_as_id;
use crate::compliance::role_manager::RoleManager;
use crate::error::ApiError;
use crate::middleware::body::{buffer_response, json_body, rebuild_response, rewrite_response};
use crate::middleware::route::{parse_flag, query_param, ApiRoute};
use crate::state::AppState;

/// Decorates role reads with `accessible_tabs` when asked to (`?accessible_tabs=true`).
/// Gold license only; other tiers see the host response untouched.
pub async fn accessible_tabs_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.stores.license.is_gold() {
        return Ok(next.run(request).await);
    }

    let wanted = request.method() == Method::GET
        && ApiRoute::from_uri(request.uri())
            .map(|route| route.targets(&state.settings.system_service, "role"))
            .unwrap_or(false)
        && query_param(request.uri(), "accessible_tabs")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

    let response = next.run(request).await;
    if !wanted || !response.status().is_success() {
        return Ok(response);
    }

    let (parts, bytes) = buffer_response(response, state.settings.max_body_bytes).await?;
    let Some(Value::Object(mut body)) = json_body(&bytes) else {
        return Ok(rebuild_response(parts, bytes));
    };

    let roles = state.gate.role_manager();
    match body.get_mut("resource") {
        Some(Value::Array(items)) => {
            for item in items.iter_mut() {
                if let Value::Object(role) = item {
                    add_accessible_tabs(roles, role).await?;
                }
            }
        }
        _ => add_accessible_tabs(roles, &mut body).await?,
    }

    rewrite_response(parts, &Value::Object(body))
}

async fn add_accessible_tabs(roles: &RoleManager, role: &mut Map<String, Value>) -> Result<(), ApiError> {
    let Some(role_id) = role.get("id").and_then(value_as_id) else {
        return Ok(());
    };
    let tabs = roles.get_accessible_tabs_by_role_id(role_id).await?;
    role.insert(
        "accessible_tabs".to_string(),
        Value::Array(tabs.into_iter().map(|t| Value::String(t.to_string())).collect()),
    );
    Ok(())
}
