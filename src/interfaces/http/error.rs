//! Maps `FabricError` to HTTP responses at the edge: every error response
//! carries `{error: {code, message, timestamp, path}}`. Internally, every
//! layer below this one returns `FabricError` — only this module renders it.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::domain::errors::FabricError;
use crate::interfaces::http::dto::ErrorBody;

/// Wraps a `FabricError` with the request path it occurred on, so the
/// rendered body can carry `path` without threading it through every
/// Result in the call chain.
pub struct ApiError {
    pub source: FabricError,
    pub path: String,
}

impl ApiError {
    pub fn new(source: FabricError, path: impl Into<String>) -> Self {
        Self {
            source,
            path: path.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.source.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody::from_error(&self.source, &self.path);
        (status, Json(body)).into_response()
    }
}

pub fn not_found(path: &str) -> ApiError {
    ApiError::new(FabricError::NotFound(format!("no route for {path}")), path)
}
