//! services/api/src/error.rs
//!
//! Defines the error types for the API service: `ApiError` for startup failures and
//! `ServiceError` for failures of individual requests.

use crate::config::ConfigError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lms_core::ports::PortError;
use serde_json::json;
use tracing::error;

/// The primary error type for starting and running the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a failure while applying the embedded migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// A failed service call. The message is shown to the client as-is.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    /// A duplicate record or a state that does not allow the operation.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Invalid(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    /// Anything the store reported that the service did not anticipate.
    #[error("{0}")]
    Port(#[from] PortError),

    #[error("{0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Invalid(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::Port(PortError::Conflict(_)) => StatusCode::CONFLICT,
            ServiceError::Port(_) | ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {:?}", self);
        }
        let body = json!({
            "success": false,
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceError::Invalid(rejection.body_text())
    }
}

/// Maps a missing row onto a `NotFound` with a client-facing `message`, passing
/// every other port failure through.
pub fn not_found(message: &'static str) -> impl FnOnce(PortError) -> ServiceError {
    move |e| match e {
        PortError::NotFound(_) => ServiceError::NotFound(message.to_string()),
        other => ServiceError::Port(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_failure_kind() {
        assert_eq!(
            ServiceError::Unauthorized("Token expired".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServiceError::Forbidden("Permission denied".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ServiceError::Port(PortError::Unexpected("boom".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn missing_rows_get_the_friendly_message() {
        let err = not_found("Course not found")(PortError::NotFound("Course 42".into()));
        assert_eq!(err.to_string(), "Course not found");
        let err = not_found("Course not found")(PortError::Unexpected("pool closed".into()));
        assert!(matches!(err, ServiceError::Port(_)));
    }
}
