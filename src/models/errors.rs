use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Method {method} not allowed")]
    MethodNotAllowed { method: String },

    #[error("Request timed out")]
    RequestTimeout,

    #[error("Payload too large: limit is {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Unsupported media type: {message}")]
    UnsupportedMedia { message: String },

    #[error("Upload rejected by storage provider: {message}")]
    UploadRejected { message: String },

    #[error("Storage provider error: {message}")]
    StorageError { message: String },

    #[error("Database error: {message}")]
    DatabaseError { message: String },

    #[error("Internal server error: {message}")]
    InternalError { message: String },
}

/// JSON body returned for every failed request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

pub struct ErrorHandler;

impl ErrorHandler {
    /// Maps an AppError to its HTTP status and client-facing body.
    ///
    /// Upstream failures keep their details out of the body; those are logged instead.
    pub fn handle_error(error: &AppError) -> (StatusCode, ErrorResponse) {
        match error {
            AppError::ValidationError { message } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    message: message.clone(),
                    error_code: "VALIDATION_FAILED".to_string(),
                    details: None,
                },
            ),

            AppError::Unauthorized { message } => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse {
                    message: message.clone(),
                    error_code: "UNAUTHORIZED".to_string(),
                    details: None,
                },
            ),

            AppError::Forbidden { message } => (
                StatusCode::FORBIDDEN,
                ErrorResponse {
                    message: message.clone(),
                    error_code: "FORBIDDEN".to_string(),
                    details: None,
                },
            ),

            AppError::NotFound { resource, id } => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    message: format!("{} not found", resource),
                    error_code: "NOT_FOUND".to_string(),
                    details: Some(format!("No {} with id '{}'", resource.to_lowercase(), id)),
                },
            ),

            AppError::Conflict { message } => (
                StatusCode::CONFLICT,
                ErrorResponse {
                    message: message.clone(),
                    error_code: "CONFLICT".to_string(),
                    details: None,
                },
            ),

            AppError::MethodNotAllowed { method } => (
                StatusCode::METHOD_NOT_ALLOWED,
                ErrorResponse {
                    message: format!("Method {} is not allowed on this route", method),
                    error_code: "METHOD_NOT_ALLOWED".to_string(),
                    details: None,
                },
            ),

            AppError::RequestTimeout => (
                StatusCode::REQUEST_TIMEOUT,
                ErrorResponse {
                    message: "Request took too long to complete".to_string(),
                    error_code: "REQUEST_TIMEOUT".to_string(),
                    details: None,
                },
            ),

            AppError::PayloadTooLarge { limit } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorResponse {
                    message: "File too large".to_string(),
                    error_code: "PAYLOAD_TOO_LARGE".to_string(),
                    details: Some(format!("Maximum upload size is {} bytes", limit)),
                },
            ),

            AppError::UnsupportedMedia { message } => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                ErrorResponse {
                    message: "Unsupported file format".to_string(),
                    error_code: "UNSUPPORTED_MEDIA".to_string(),
                    details: Some(message.clone()),
                },
            ),

            AppError::UploadRejected { message } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    message: "Upload rejected".to_string(),
                    error_code: "UPLOAD_REJECTED".to_string(),
                    details: Some(message.clone()),
                },
            ),

            AppError::StorageError { .. } => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse {
                    message: "Media storage is unavailable".to_string(),
                    error_code: "STORAGE_FAILED".to_string(),
                    details: None,
                },
            ),

            AppError::DatabaseError { .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse {
                    message: "Database operation failed".to_string(),
                    error_code: "DATABASE_FAILED".to_string(),
                    details: None,
                },
            ),

            AppError::InternalError { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    message: "An unexpected error occurred".to_string(),
                    error_code: "INTERNAL_ERROR".to_string(),
                    details: None,
                },
            ),
        }
    }

    /// Upstream and internal failures are the ones worth an error-level log line
    pub fn is_upstream(error: &AppError) -> bool {
        matches!(
            error,
            AppError::StorageError { .. }
                | AppError::DatabaseError { .. }
                | AppError::InternalError { .. }
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if ErrorHandler::is_upstream(&self) {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        let (status, body) = ErrorHandler::handle_error(&self);
        (status, Json(body)).into_response()
    }
}

// Convenience functions for creating specific errors
impl AppError {
    pub fn validation_failed(message: impl Into<String>) -> Self {
        AppError::ValidationError { message: message.into() }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        AppError::Unauthorized { message: message.into() }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Forbidden { message: message.into() }
    }

    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        AppError::NotFound { resource, id: id.into() }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        AppError::Conflict { message: message.into() }
    }

    pub fn method_not_allowed(method: impl Into<String>) -> Self {
        AppError::MethodNotAllowed { method: method.into() }
    }

    pub fn payload_too_large(limit: usize) -> Self {
        AppError::PayloadTooLarge { limit }
    }

    pub fn unsupported_media(message: impl Into<String>) -> Self {
        AppError::UnsupportedMedia { message: message.into() }
    }

    pub fn upload_rejected(message: impl Into<String>) -> Self {
        AppError::UploadRejected { message: message.into() }
    }

    pub fn storage_failed(message: impl Into<String>) -> Self {
        AppError::StorageError { message: message.into() }
    }

    pub fn database_failed(message: impl Into<String>) -> Self {
        AppError::DatabaseError { message: message.into() }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        AppError::InternalError { message: message.into() }
    }
}
