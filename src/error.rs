//! Error types for Shroud
//!
//! Request-terminal failures of the gateway pipeline. Everything downstream of the
//! upstream call degrades instead of erroring, so it has no variant here.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::translate::TranslationError;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("You have reached your monthly limit. Please upgrade your plan.")]
    QuotaExceeded { used: i64, limit: i64 },

    #[error("Quota service unavailable")]
    QuotaUnavailable(String),

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Please configure an API key for {0} in your dashboard")]
    ProviderNotConfigured(String),

    #[error("Failed to convert request for {provider}: {source}")]
    UnsupportedTranslation {
        provider: String,
        #[source]
        source: TranslationError,
    },

    #[error("Upstream provider unreachable: {0}")]
    UpstreamUnreachable(String),

    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub error: String,
    /// Human-readable explanation
    pub message: String,
}

impl AppError {
    /// HTTP status and machine-readable code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::QuotaExceeded { .. } => (StatusCode::PAYMENT_REQUIRED, "quota_exceeded"),
            AppError::QuotaUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "quota_unavailable")
            }
            AppError::MalformedRequest(_) => (StatusCode::BAD_REQUEST, "malformed_request"),
            AppError::ProviderNotConfigured(_) => {
                (StatusCode::PAYMENT_REQUIRED, "provider_not_configured")
            }
            AppError::UnsupportedTranslation { .. } => {
                (StatusCode::BAD_REQUEST, "unsupported_translation")
            }
            AppError::UpstreamUnreachable(_) => (StatusCode::BAD_GATEWAY, "upstream_unreachable"),
            AppError::RedisError(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            AppError::QuotaUnavailable(_) => {
                "Unable to verify your quota right now. Please retry shortly.".to_string()
            }
            AppError::UpstreamUnreachable(_) => "Upstream provider unreachable".to_string(),
            AppError::RedisError(_) | AppError::Internal(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error: code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
