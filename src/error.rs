//! Error types for Lorekeeper
//!
//! All errors implement `IntoResponse` for Axum handlers. Every failure is
//! reported to the caller as HTTP 500 with a `{ "error": message }` body;
//! the variants exist for logging and metrics, not for status mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file {path}: {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration in {path}: {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    #[error("Invalid request body: {0}")]
    MalformedRequest(String),

    #[error("{0} is not configured")]
    MissingCredential(String),

    #[error("Request to {provider} failed: {reason}")]
    UpstreamRequest { provider: String, reason: String },

    #[error("{provider} API error: status {status}")]
    UpstreamStatus { provider: String, status: u16 },

    #[error("Unexpected response from {provider}: {reason}")]
    UpstreamResponse { provider: String, reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Short label used for the `outcome` metric and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_)
            | Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigValidationFailed { .. } => "config",
            Self::MalformedRequest(_) => "malformed_request",
            Self::MissingCredential(_) => "missing_credential",
            Self::UpstreamRequest { .. }
            | Self::UpstreamStatus { .. }
            | Self::UpstreamResponse { .. } => "upstream",
            Self::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "error": self.to_string(),
        }));

        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;
