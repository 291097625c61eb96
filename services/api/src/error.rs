//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and how it is
//! rendered as an HTTP response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use parts_finder_core::ports::PortError;
use serde_json::json;
use tracing::error;

use crate::config::ConfigError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The request itself was unusable; the message is shown to the user.
    #[error("{0}")]
    InvalidInput(String),

    /// No valid session accompanies a request for a protected resource.
    #[error("Authentication required")]
    Unauthorized,

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Port(PortError::InvalidInput(msg)) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized | ApiError::Port(PortError::Unauthorized) => (
                StatusCode::UNAUTHORIZED,
                "You must be logged in to use this feature".to_string(),
            ),
            ApiError::Port(PortError::NotConfigured(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "This feature is temporarily unavailable".to_string(),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error, please try again".to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            error!("Request failed: {:?}", self);
        }
        (status, Json(json!({ "success": false, "message": message }))).into_response()
    }
}
