//! HTTP-facing errors.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::{StoreError, StoreErrorKind};

/// Errors returned by request handlers, each mapped to one status code.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum ApiError {
    /// Request body, path or query failed validation.
    #[display("Invalid request: {}", message)]
    Validation {
        /// What was wrong.
        message: String,
    },
    /// Requested player or row does not exist.
    #[display("Not found: {}", message)]
    NotFound {
        /// What was missing.
        message: String,
    },
    /// Request conflicts with stored state.
    #[display("Conflict: {}", message)]
    Conflict {
        /// What conflicted.
        message: String,
    },
    /// Storage or runtime failure. Details are logged, not returned.
    #[display("Internal error: {}", message)]
    Internal {
        /// Failure detail for the log.
        message: String,
    },
}

impl ApiError {
    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Status code this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err.kind() {
            StoreErrorKind::AlreadyExists => Self::Conflict {
                message: err.message,
            },
            StoreErrorKind::NotFound | StoreErrorKind::UnknownPlayer => Self::NotFound {
                message: err.message,
            },
            StoreErrorKind::InvalidScore => Self::Validation {
                message: err.message,
            },
            StoreErrorKind::Storage => Self::Internal {
                message: err.to_string(),
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Internal { message } => {
                error!(error = %message, "Request failed");
                "Internal Server Error".to_string()
            }
            Self::Validation { message }
            | Self::NotFound { message }
            | Self::Conflict { message } => {
                warn!(status = %status, error = %message, "Request rejected");
                message.clone()
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}
