use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Value};

/// Platform-style response: lists go out as `{"resource": [...]}`, single records as-is
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    wrap: bool,
}

impl<T: Serialize> ApiResponse<T> {
    /// A single record
    pub fn success(data: T) -> Self {
        Self { data, wrap: false }
    }

    /// A list of records under the `resource` key
    pub fn resource(data: T) -> Self {
        Self { data, wrap: true }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let data_value = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return crate::error::ApiError::internal_server_error("Failed to serialize response data")
                    .into_response();
            }
        };

        let body: Value = if self.wrap {
            json!({ "resource": data_value })
        } else {
            data_value
        };

        (StatusCode::OK, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;
