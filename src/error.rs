//! Error types for the visitor log

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::store::BackendError;

/// Stable error codes exposed to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    MissingIndex = 2,
    PermissionDenied = 3,
    TransientQueryFailure = 4,
    MalformedRecord = 5,
    NoSuchVisitor = 6,
    BadValue = 7,
    InvalidTransition = 8,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// The constraint combination needs a backend index that does not exist yet
    #[error("Missing index: {0}")]
    MissingIndex(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Query failed: {0}")]
    TransientQueryFailure(String),

    /// A stored document failed required-field validation
    #[error("Malformed record {id}: {reason}")]
    MalformedRecord { id: String, reason: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::MissingIndex(_) => ErrorCode::MissingIndex,
            AppError::PermissionDenied(_) => ErrorCode::PermissionDenied,
            AppError::TransientQueryFailure(_) => ErrorCode::TransientQueryFailure,
            AppError::MalformedRecord { .. } => ErrorCode::MalformedRecord,
            AppError::NotFound(_) => ErrorCode::NoSuchVisitor,
            AppError::Validation(_) | AppError::BadRequest(_) => ErrorCode::BadValue,
            AppError::BusinessRule(_) => ErrorCode::InvalidTransition,
            AppError::Internal(_) => ErrorCode::Failure,
        }
    }

    /// Message suitable for showing to front desk staff
    pub fn user_message(&self) -> String {
        match self {
            AppError::MissingIndex(_) => {
                "Missing database index. Please wait while the database is set up, then retry."
                    .to_string()
            }
            AppError::PermissionDenied(_) => {
                "Permission denied. Please check your authentication.".to_string()
            }
            AppError::TransientQueryFailure(_) => {
                "Failed to load visitors. Please try again.".to_string()
            }
            AppError::Internal(_) => "Internal error".to_string(),
            other => other.to_string(),
        }
    }

    /// Whether offering a manual retry makes sense
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::MissingIndex(_) | AppError::TransientQueryFailure(_)
        )
    }
}

impl From<BackendError> for AppError {
    /// Classify a backend failure by its error code
    fn from(err: BackendError) -> Self {
        match err.code.as_str() {
            "failed-precondition" => AppError::MissingIndex(err.message),
            "permission-denied" | "unauthenticated" => AppError::PermissionDenied(err.message),
            _ => AppError::TransientQueryFailure(format!("{}: {}", err.code, err.message)),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::MissingIndex(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::TransientQueryFailure(_) => StatusCode::BAD_GATEWAY,
            AppError::MalformedRecord { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::BusinessRule(_) => StatusCode::CONFLICT,
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let code = self.code();
        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message: self.user_message(),
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
