use std::sync::atomic::{AtomicBool, Ordering};

use axum::extract::multipart::MultipartError;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use service::errors::ServiceError;
use thiserror::Error;
use tracing::error;

static EXPOSE_ERROR_DETAILS: AtomicBool = AtomicBool::new(false);

/// Attach internal error details to 500 responses. Set once at startup.
pub fn set_expose_error_details(on: bool) {
    EXPOSE_ERROR_DETAILS.store(on, Ordering::Relaxed);
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

/// Error response for every API endpoint: `{ error, message, detail? }`.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    detail: Option<String>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self { status, code, message: message.into(), detail: None }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation_error", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthenticated", message)
    }

    /// Generic 500; the cause is logged and only echoed when details are exposed.
    pub fn internal(cause: impl std::fmt::Display) -> Self {
        let cause = cause.to_string();
        error!(error = %cause, "internal error");
        let detail = EXPOSE_ERROR_DETAILS.load(Ordering::Relaxed).then_some(cause);
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, code: "internal_error", message: "internal server error".into(), detail }
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(m) => Self::bad_request(m),
            ServiceError::Unauthenticated(m) => Self::unauthorized(m),
            ServiceError::Forbidden(m) => Self::new(StatusCode::FORBIDDEN, "forbidden", m),
            ServiceError::NotFound(m) => Self::new(StatusCode::NOT_FOUND, "not_found", m),
            ServiceError::Conflict(m) => Self::new(StatusCode::CONFLICT, "conflict", m),
            ServiceError::Internal(m) => Self::internal(m),
        }
    }
}

impl From<JsonRejection> for JsonApiError {
    fn from(r: JsonRejection) -> Self { Self::bad_request(r.body_text()) }
}

impl From<QueryRejection> for JsonApiError {
    fn from(r: QueryRejection) -> Self { Self::bad_request(r.body_text()) }
}

impl From<PathRejection> for JsonApiError {
    fn from(r: PathRejection) -> Self { Self::bad_request(r.body_text()) }
}

impl From<MultipartError> for JsonApiError {
    fn from(e: MultipartError) -> Self { Self::new(e.status(), "validation_error", e.body_text()) }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { error: self.code, message: self.message, detail: self.detail };
        (self.status, Json(body)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("runtime check failed: {0}")]
    Runtime(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
