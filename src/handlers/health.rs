use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health: reports the license tier and whether storage answers
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let storage_ok = state.stores.admins.list_admins().await.is_ok();
    let status = if storage_ok { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        status,
        Json(json!({
            "status": if storage_ok { "ok" } else { "degraded" },
            "license": state.stores.license.current_license_tier(),
        })),
    )
}
