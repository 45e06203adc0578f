//! API error bodies and the mapping from lifecycle failures to HTTP statuses.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::task::services::{TaskErrorKind, TaskLifecycleError};

/// JSON body returned for every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Stable error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ApiError {
    /// Creates a new API error.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Status code paired with an [`ApiError`] body.
#[derive(Debug, Clone)]
pub struct ApiErrorResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Error details.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// Creates a new API error response.
    #[must_use]
    pub const fn new(status: StatusCode, error: ApiError) -> Self {
        Self { status, error }
    }

    /// Creates a 400 Bad Request response.
    #[must_use]
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ApiError::new(code, message))
    }

    /// Maps a lifecycle failure to a response.
    ///
    /// `duplicate_status` is the status used for
    /// [`TaskErrorKind::AlreadyExists`], which differs between create
    /// (404) and update (400). Storage failures are logged and answered
    /// with a generic message.
    #[must_use]
    pub fn from_lifecycle(error: &TaskLifecycleError, duplicate_status: StatusCode) -> Self {
        let kind = error.kind();
        let (status, code) = match kind {
            TaskErrorKind::InvalidTitle => (StatusCode::BAD_REQUEST, "INVALID_TITLE"),
            TaskErrorKind::InvalidDate => (StatusCode::BAD_REQUEST, "INVALID_DATE"),
            TaskErrorKind::InvalidStatus => (StatusCode::BAD_REQUEST, "INVALID_STATUS"),
            TaskErrorKind::InvalidId => (StatusCode::BAD_REQUEST, "INVALID_ID"),
            TaskErrorKind::AlreadyExists => (duplicate_status, "ALREADY_EXISTS"),
            TaskErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            TaskErrorKind::DeadlineExceeded => {
                tracing::warn!(%error, "storage deadline exceeded");
                return Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    ApiError::new("DEADLINE_EXCEEDED", "storage did not respond in time"),
                );
            }
            TaskErrorKind::Storage => {
                tracing::error!(%error, "storage failure");
                return Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::new("INTERNAL_ERROR", "internal server error"),
                );
            }
        };
        tracing::warn!(%error, ?kind, "request rejected");
        Self::new(status, ApiError::new(code, error.to_string()))
    }
}

impl From<JsonRejection> for ApiErrorResponse {
    fn from(rejection: JsonRejection) -> Self {
        tracing::warn!(error = %rejection, "malformed request body");
        Self::bad_request("INVALID_BODY", rejection.body_text())
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}
