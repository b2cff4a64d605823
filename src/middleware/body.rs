use axum::{
    body::{to_bytes, Body, Bytes},
    extract::Request,
    http::{header, request, response},
    response::Response,
};
use serde_json::Value;

use crate::error::ApiError;

/// Read the whole request body, refusing anything over `limit` bytes
pub async fn buffer_request(request: Request, limit: usize) -> Result<(request::Parts, Bytes), ApiError> {
    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, limit)
        .await
        .map_err(|_| ApiError::payload_too_large("Request body is too large"))?;
    Ok((parts, bytes))
}

pub async fn buffer_response(response: Response, limit: usize) -> Result<(response::Parts, Bytes), ApiError> {
    let (parts, body) = response.into_parts();
    let bytes = to_bytes(body, limit).await.map_err(|e| {
        tracing::error!("Failed to buffer response body: {}", e);
        ApiError::internal_server_error("Failed to read response")
    })?;
    Ok((parts, bytes))
}

/// Parse a JSON body; empty or non-JSON bodies yield `None`
pub fn json_body(bytes: &Bytes) -> Option<Value> {
    if bytes.is_empty() {
        return None;
    }
    serde_json::from_slice(bytes).ok()
}

pub fn rebuild_request(parts: request::Parts, bytes: Bytes) -> Request {
    Request::from_parts(parts, Body::from(bytes))
}

/// Replace the request body with `value`
pub fn rewrite_request(mut parts: request::Parts, value: &Value) -> Result<Request, ApiError> {
    let bytes = serde_json::to_vec(value).map_err(|e| ApiError::invalid_json(e.to_string()))?;
    parts.headers.remove(header::CONTENT_LENGTH);
    Ok(Request::from_parts(parts, Body::from(bytes)))
}

pub fn rebuild_response(parts: response::Parts, bytes: Bytes) -> Response {
    Response::from_parts(parts, Body::from(bytes))
}

/// Replace the response body with `value`
pub fn rewrite_response(mut parts: response::Parts, value: &Value) -> Result<Response, ApiError> {
    let bytes = serde_json::to_vec(value).map_err(|e| {
        tracing::error!("Failed to serialize response body: {}", e);
        ApiError::internal_server_error("Failed to format response")
    })?;
    parts.headers.remove(header::CONTENT_LENGTH);
    Ok(Response::from_parts(parts, Body::from(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn rewrite_drops_stale_length() {
        let request = Request::builder()
            .uri("/api/v2/system/admin")
            .header(header::CONTENT_LENGTH, "2")
            .body(Body::from("{}"))
            .unwrap();
        let (parts, bytes) = buffer_request(request, 1024).await.unwrap();
        assert_eq!(json_body(&bytes), Some(json!({})));

        let rewritten = rewrite_request(parts, &json!({"email": "a@x.io"})).unwrap();
        assert!(rewritten.headers().get(header::CONTENT_LENGTH).is_none());
    }

    #[tokio::test]
    async fn oversized_bodies_are_rejected() {
        let request = Request::builder().body(Body::from(vec![b'a'; 64])).unwrap();
        let err = buffer_request(request, 16).await.unwrap_err();
        assert_eq!(err.status_code(), 413);
    }

    #[test]
    fn non_json_is_none() {
        assert_eq!(json_body(&Bytes::from_static(b"")), None);
        assert_eq!(json_body(&Bytes::from_static(b"not json")), None);
    }
}
