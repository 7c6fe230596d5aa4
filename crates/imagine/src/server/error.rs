//! Maps resolution errors to HTTP responses with a JSON error body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use imagine_core::ResolveError;
use thiserror::Error;

/// Application-level error type that maps to HTTP responses.
#[derive(Error, Debug)]
pub enum AppError {
    /// Unknown filter set, missing source or unaddressable path.
    #[error("not found: {0}")]
    NotFound(String),

    /// Filter, storage or task failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ResolveError> for AppError {
    fn from(error: ResolveError) -> Self {
        if error.is_not_found() {
            AppError::NotFound(error.to_string())
        } else {
            AppError::Internal(error.to_string())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = serde_json::json!({
            "error": {
                "code": status.as_u16(),
                "message": self.to_string(),
            }
        });
        (status, axum::Json(body)).into_response()
    }
}
