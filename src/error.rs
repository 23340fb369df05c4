//! Error kinds surfaced across the ingest boundary.
//!
//! `AppError` covers only what ingestion can hand back to a caller
//! synchronously. Everything that happens inside the worker after an event
//! is enqueued is logged and neutralized there — it never reaches this type.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("near capacity, retry")]
    Admission,

    #[error("downstream error: {0}")]
    Downstream(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            AppError::Authentication(_) => (StatusCode::UNAUTHORIZED, "authentication_error"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::Admission => (StatusCode::SERVICE_UNAVAILABLE, "admission_error"),
            AppError::Downstream(_) => (StatusCode::INTERNAL_SERVER_ERROR, "downstream_error"),
        };

        let body = Json(json!({
            "error": kind,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}
