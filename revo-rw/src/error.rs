//! API error type and HTTP status mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request outside the workflow taxonomy (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Workflow error, mapped per variant
    #[error(transparent)]
    Workflow(#[from] revo_common::Error),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use revo_common::Error as E;

        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Workflow(err) => match err {
                E::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
                E::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_FAILED", msg),
                E::InvalidStep(msg) => (StatusCode::BAD_REQUEST, "INVALID_STEP", msg),
                E::RecordBusy(msg) => (StatusCode::CONFLICT, "RECORD_BUSY", msg),
                E::Transient(msg) => (StatusCode::BAD_GATEWAY, "BACKEND_UNAVAILABLE", msg),
                E::CorruptResult(msg) => (StatusCode::BAD_GATEWAY, "CORRUPT_ANALYSIS", msg),
                E::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR", msg),
                E::Io(err) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "IO_ERROR",
                    err.to_string(),
                ),
                E::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            },
            ApiError::Other(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
