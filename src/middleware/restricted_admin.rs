use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::error::ApiError;
use crate::middleware::auth::request_session;
use crate::middleware::body::{buffer_request, json_body, rebuild_request, rewrite_request};
use crate::middleware::route::ApiRoute;
use crate::state::AppState;
use crate::types::AdminAction;

const ADMIN_RESOURCE: &str = "admin";
const SESSION_RESOURCE: &str = "session";

/// Syncs restricted-admin roles and app links on admin create/update, then hands the
/// rewritten record(s) to the host handler. Any failure aborts before the host runs.
pub async fn restricted_admin_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(action) = AdminAction::from_method(request.method()) else {
        return Ok(next.run(request).await);
    };
    let route = ApiRoute::from_uri(request.uri()).filter(|route| {
        route.targets(&state.settings.system_service, ADMIN_RESOURCE)
            && route.resource_id() != Some(SESSION_RESOURCE)
    });
    let Some(route) = route else {
        return Ok(next.run(request).await);
    };
    let path_id = route.resource_id().and_then(|id| id.parse::<i64>().ok());

    let session = request_session(&request);
    let (parts, bytes) = buffer_request(request, state.settings.max_body_bytes).await?;
    let Some(body) = json_body(&bytes) else {
        debug!("Admin {:?} without a JSON body, passing through", action);
        return Ok(next.run(rebuild_request(parts, bytes)).await);
    };

    let rewritten = state.gate.process(&session, action, body, path_id).await?;
    let request = rewrite_request(parts, &rewritten)?;
    Ok(next.run(request).await)
}
