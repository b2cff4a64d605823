use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::error;

use crate::compliance::audit::{ServiceAction, ServiceTarget};
use crate::compliance::session::CurrentSession;
use crate::error::ApiError;
use crate::middleware::auth::request_session;
use crate::middleware::body::{buffer_request, json_body, rebuild_request};
use crate::middleware::route::{ids_param, ApiRoute};
use crate::state::AppState;

/// Writes a service report row for each service a successful write request touched
pub async fn service_audit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.settings.enable_service_audit || ServiceAction::from_method(request.method()).is_none() {
        return Ok(next.run(request).await);
    }
    let route = match ApiRoute::from_uri(request.uri()) {
        Some(route) if route.targets(&state.settings.system_service, "service") => route,
        _ => return Ok(next.run(request).await),
    };

    let method = request.method().clone();
    let ids = ids_param(request.uri());
    let user_email = request_session(&request).user_email();

    let (parts, bytes) = buffer_request(request, state.settings.max_body_bytes).await?;
    let payload = json_body(&bytes);
    let target = ServiceTarget {
        path_id: route.resource_id().and_then(|id| id.parse().ok()),
        ids,
        payload: payload.as_ref(),
    };
    let changes = state.audit.collect(&method, &target).await?;

    let response = next.run(rebuild_request(parts, bytes)).await;
    if response.status().is_success() {
        // The host change is already committed; a failed report must not turn it into an error
        if let Err(e) = state.audit.record(&user_email, changes).await {
            error!("Failed to record service audit: {}", e);
        }
    }
    Ok(response)
}
