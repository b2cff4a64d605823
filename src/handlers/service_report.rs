// handlers/service_report.rs - /api/{version}/system/service_report
//
// The audit log is append-only from the outside: it can be listed and cleared, never edited.

use axum::{
    extract::{Query, State},
    http::Method,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::database::models::ServiceReport;
use crate::error::ApiError;
use crate::middleware::{AdminSession, ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET: newest reports first
pub async fn report_list(
    State(state): State<AppState>,
    _session: AdminSession,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Vec<ServiceReport>> {
    let settings = &state.settings;
    let limit = query
        .limit
        .unwrap_or(settings.default_report_limit)
        .clamp(1, settings.max_report_limit);
    let offset = query.offset.unwrap_or(0).max(0);

    let reports = state.stores.reports.list(limit, offset).await?;
    Ok(ApiResponse::resource(reports))
}

/// DELETE: clear the whole log
pub async fn report_delete(State(state): State<AppState>, AdminSession(user): AdminSession) -> ApiResult<Value> {
    let removed = state.stores.reports.delete_all().await?;
    info!("{} cleared {} service reports", user.email, removed);
    Ok(ApiResponse::success(json!({ "count": removed })))
}

/// POST/PUT/PATCH
pub async fn report_unsupported(method: Method) -> ApiError {
    ApiError::not_implemented(format!("The verb \"{}\" is not supported.", method))
}
