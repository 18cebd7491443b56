//! Server error types with HTTP status code mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use geolead_api::EngineError;
use serde::Serialize;
use thiserror::Error;

/// Server error type that wraps engine errors and provides HTTP status mapping
#[derive(Error, Debug)]
pub enum ServerError {
    /// Admission/search pipeline error
    #[error("{0}")]
    Engine(#[from] EngineError),

    /// Generic bad request error
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Startup configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error (catalog loading, listener binding)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Create a bad request error
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ServerError::BadRequest(msg.into())
    }

    /// Stable machine-readable error code for response bodies
    pub fn error_code(&self) -> &'static str {
        match self {
            ServerError::Engine(e) => e.code(),
            ServerError::BadRequest(_) => "INVALID_INPUT",
            ServerError::Config(_) => "ENGINE_MISCONFIGURED",
            ServerError::Io(_) => "IO_FAILURE",
        }
    }

    /// Map error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 - Bad Request (client errors)
            ServerError::Engine(EngineError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ServerError::Engine(EngineError::OutsideServiceArea { .. }) => StatusCode::BAD_REQUEST,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,

            // 503 - quota store unreachable; enforcement fails closed
            ServerError::Engine(EngineError::EnforcementUnavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }

            // 500 - server-side failures
            ServerError::Engine(EngineError::Candidates(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Engine(EngineError::Config(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// HTTP status code
    pub status: u16,
    /// Machine-readable error code
    pub code: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if status.is_server_error() {
            tracing::error!(code, status = status.as_u16(), "request failed: {self}");
        } else {
            tracing::debug!(code, status = status.as_u16(), "request rejected: {self}");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            status: status.as_u16(),
            code: code.to_string(),
        };

        let json = serde_json::to_string(&body).unwrap_or_else(|_| {
            format!(
                r#"{{"error":"{}","status":{},"code":"{}"}}"#,
                self,
                status.as_u16(),
                code
            )
        });

        (status, [("content-type", "application/json")], json).into_response()
    }
}

/// Result type alias for server operations
pub type Result<T> = std::result::Result<T, ServerError>;
