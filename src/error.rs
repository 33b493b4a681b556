//! Bridge Error Types
//!
//! One error enum shared by the store adapters, the ingestion service and the
//! background workers, with a JSON rendering for HTTP clients.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error body returned by the ingestion service
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

#[derive(Debug, Error)]
pub enum BridgeError {
    /// An inbound payload failed shape checks.
    #[error("invalid field '{field}': {reason}")]
    Validation { field: String, reason: String },

    /// The remote memory store could not be reached or rejected the call.
    #[error("memory store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("update queue is full ({capacity} updates pending)")]
    QueueFull { capacity: usize },

    #[error("update queue is closed")]
    QueueClosed,

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl BridgeError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn store(err: impl std::fmt::Display) -> Self {
        Self::StoreUnavailable(err.to_string())
    }

    /// Get error code for client identification
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "INVALID_INPUT",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::QueueFull { .. } => "QUEUE_FULL",
            Self::QueueClosed => "QUEUE_CLOSED",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::StoreUnavailable(_) | Self::QueueFull { .. } | Self::QueueClosed => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Config(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
        }
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self.to_response())).into_response()
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_is_client_error() {
        let err = BridgeError::validation("progress", "must be between 0 and 100");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "INVALID_INPUT");
        assert!(err.to_response().message.contains("progress"));
    }

    #[test]
    fn test_store_errors_map_to_service_unavailable() {
        let err = BridgeError::store("connection refused");
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.to_string(), "memory store unavailable: connection refused");
    }
}
