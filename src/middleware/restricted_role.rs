use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::middleware::auth::request_session;
use crate::middleware::route::{target_ids, ApiRoute};
use crate::state::AppState;

/// Blocks deletion of restricted admins' roles unless the caller is the root admin.
/// Applies on every license tier.
pub async fn restricted_role_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if request.method() != Method::DELETE {
        return Ok(next.run(request).await);
    }

    let role_ids = match ApiRoute::from_uri(request.uri()) {
        Some(route) if route.targets(&state.settings.system_service, "role") => {
            target_ids(&route, request.uri())
        }
        _ => Vec::new(),
    };

    if !role_ids.is_empty() {
        let session = request_session(&request);
        state.guard.ensure_can_delete_roles(&session, &role_ids).await?;
    }

    Ok(next.run(request).await)
}
