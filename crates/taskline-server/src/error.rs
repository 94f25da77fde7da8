//! HTTP error mapping.
//!
//! Every failure leaves the server as `{"error": CODE, "message": text}`.
//! Storage details stay in the logs; clients get a generic message.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use taskline_core::{TaskId, ValidationError};
use taskline_store::TaskError;
use tracing::{debug, error};

/// Bad input from the client.
pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
/// No task with the requested id.
pub const NOT_FOUND: &str = "NOT_FOUND";
/// The storage layer failed.
pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
/// The server failed outside the storage layer.
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";

/// Wire-format error body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// Machine-readable code.
    pub error: &'static str,
    /// Human-readable message.
    pub message: String,
}

/// Error type returned by handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A field failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The request could not be decoded (bad JSON, bad path or query value).
    #[error("{0}")]
    BadRequest(String),

    /// No such task.
    #[error("task not found: {id}")]
    NotFound {
        /// Requested id.
        id: TaskId,
    },

    /// The storage layer failed. Already logged by the engine.
    #[error("the task store is unavailable, try again later")]
    Storage,

    /// Anything else, such as a panicked blocking task.
    #[error("internal error")]
    Internal(String),
}

impl ApiError {
    /// Machine-readable error code for this variant.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => VALIDATION_ERROR,
            Self::NotFound { .. } => NOT_FOUND,
            Self::Storage => STORAGE_ERROR,
            Self::Internal(_) => INTERNAL_ERROR,
        }
    }

    /// HTTP status for this variant.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Storage | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert to the wire-format error body.
    pub fn to_error_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.code(),
            message: self.to_string(),
        }
    }
}

impl From<TaskError> for ApiError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::Validation(e) => Self::Validation(e),
            TaskError::NotFound { id } => Self::NotFound { id },
            TaskError::Storage(_) => Self::Storage,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Internal(detail) => error!(detail = %detail, "request failed"),
            Self::Validation(_) | Self::BadRequest(_) => debug!(error = %self, "rejected request"),
            Self::NotFound { .. } | Self::Storage => {}
        }
        (self.status(), Json(self.to_error_body())).into_response()
    }
}
