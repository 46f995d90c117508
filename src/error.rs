//! Service error types with HTTP status code mapping.
//!
//! [`BadgeError`] is the error type returned by the badge service and the
//! persistence layer. Each variant maps to an HTTP status code and a JSON
//! error body. Mirror failures use [`crate::mirror::SyncError`] instead and
//! never reach an HTTP response.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::ValidationErrors;

/// JSON error response body.
///
/// `error` is a plain string because the admin UI shows it verbatim:
/// ```json
/// {
///   "error": "Timer name already exists",
///   "code": 1003
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Numeric error code (see code ranges on [`BadgeError`]).
    pub code: u32,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category   | HTTP Status               |
/// |-----------|------------|---------------------------|
/// | 1000–1999 | Validation | 400 Bad Request           |
/// | 2000–2999 | Not Found  | 404 Not Found             |
/// | 3000–3999 | Server     | 500 Internal Server Error |
#[derive(Debug, thiserror::Error)]
pub enum BadgeError {
    /// The request payload is malformed or failed field validation.
    #[error("{0}")]
    InvalidInput(String),

    /// Another badge already uses this timer name.
    #[error("Timer name already exists")]
    DuplicateName(String),

    /// No badge with the given id exists.
    #[error("Badge not found: {0}")]
    NotFound(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BadgeError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidInput(_) => 1001,
            Self::DuplicateName(_) => 1003,
            Self::NotFound(_) => 2001,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) | Self::DuplicateName(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for BadgeError {
    fn from(errors: ValidationErrors) -> Self {
        Self::InvalidInput(errors.to_string())
    }
}

impl From<JsonRejection> for BadgeError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidInput(rejection.body_text())
    }
}

impl IntoResponse for BadgeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: self.to_string(),
            code: self.error_code(),
            details: None,
        };
        (status, axum::Json(body)).into_response()
    }
}
