//! Error types for the notification and webhook system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::store::StoreError;

/// Notification system error variants.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("SSRF protection: {0}")]
    SsrfDetected(String),

    #[error("Endpoint limit ({limit}) reached for user")]
    EndpointLimitExceeded { limit: i64 },

    #[error("Webhook endpoint not found")]
    EndpointNotFound,

    #[error("Notification not found")]
    NotificationNotFound,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// JSON error response returned by notification API endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status: u16,
}

impl IntoResponse for NotifyError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            NotifyError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_error"),
            NotifyError::InvalidUrl(_) => (StatusCode::BAD_REQUEST, "invalid_url"),
            NotifyError::SsrfDetected(_) => (StatusCode::BAD_REQUEST, "ssrf_detected"),
            NotifyError::EndpointLimitExceeded { .. } => {
                (StatusCode::CONFLICT, "endpoint_limit_exceeded")
            }
            NotifyError::EndpointNotFound => (StatusCode::NOT_FOUND, "endpoint_not_found"),
            NotifyError::NotificationNotFound => (StatusCode::NOT_FOUND, "notification_not_found"),
            NotifyError::EncryptionFailed(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "encryption_error")
            }
            NotifyError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            NotifyError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            NotifyError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
            status: status.as_u16(),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, NotifyError>;
