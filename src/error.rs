//! Domain error types for the TCC Predictor server.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use std::fmt;

use crate::services::upload::{UploadError, UploadRejection};

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Caller is not signed in
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Batch rejected by local validation (type, count, size)
    #[error("{0}")]
    Rejected(UploadRejection),

    /// One or more per-file writes failed
    #[error("{0}")]
    UploadFailed(String),

    /// Another operation for the same browser is still running
    #[error("{0}")]
    Conflict(String),

    /// Temporarily unable to take the request
    #[error("{0}")]
    ServiceUnavailable(String),

    /// Unexpected internal failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Rejected(UploadRejection::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::UploadFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (error_code, response_message) = match self {
            AppError::InvalidInput(_) => ("INVALID_INPUT", self.to_string()),
            AppError::Unauthorized(_) => ("UNAUTHORIZED", self.to_string()),
            AppError::Rejected(rejection) => (rejection.code(), self.to_string()),
            AppError::UploadFailed(_) => ("UPLOAD_FAILED", self.to_string()),
            AppError::Conflict(_) => ("CONFLICT", self.to_string()),
            AppError::ServiceUnavailable(_) => ("SERVICE_UNAVAILABLE", self.to_string()),
            AppError::Internal(err_str) => {
                tracing::error!("Internal error: {}", err_str);
                ("INTERNAL_ERROR", "An internal error occurred".to_string())
            }
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: error_code.to_string(),
            message: response_message,
        })
    }
}

/// JSON error body returned by the API.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Rejected(rejection) => AppError::Rejected(rejection),
            UploadError::NotSignedIn => AppError::Unauthorized(err.to_string()),
            UploadError::InProgress => AppError::Conflict(err.to_string()),
            UploadError::File { .. } => AppError::UploadFailed(err.to_string()),
        }
    }
}

impl From<actix_multipart::MultipartError> for AppError {
    fn from(err: actix_multipart::MultipartError) -> Self {
        AppError::InvalidInput(format!("Multipart error: {}", err))
    }
}
