//! API error handling module
//!
//! Provides a unified error type for all API endpoints with structured error variants.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mediaguard_core::{MediaGuardError, StoreError};
use thiserror::Error;

/// API error type with structured variants for different error categories
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request - client provided invalid input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Not found - requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error - unexpected server-side failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// Service unavailable - required service is not configured or available
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Error from the identification engine
    #[error("MediaGuard error: {0}")]
    MediaGuard(#[from] MediaGuardError),
}

impl ApiError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create an internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a service unavailable error
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::MediaGuard(ref e) => match e {
                // Caller asked for something that cannot be done → 400
                MediaGuardError::InvalidConfiguration(_)
                | MediaGuardError::UnknownAlgorithm { .. } => StatusCode::BAD_REQUEST,

                MediaGuardError::NotFound(_) => StatusCode::NOT_FOUND,

                // Media could not be read by the algorithm → 422
                MediaGuardError::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,

                MediaGuardError::Store(StoreError::Connection(_)) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }

                MediaGuardError::DuplicateAlgorithm(_)
                | MediaGuardError::Computation { .. }
                | MediaGuardError::Embed(_)
                | MediaGuardError::Store(_)
                | MediaGuardError::PartialRecording { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Get the error code for programmatic error handling
    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "INVALID_INPUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::MediaGuard(ref e) => match e {
                MediaGuardError::InvalidConfiguration(_) => "INVALID_CONFIGURATION",
                MediaGuardError::UnknownAlgorithm { .. } => "UNKNOWN_ALGORITHM",
                MediaGuardError::DuplicateAlgorithm(_) => "DUPLICATE_ALGORITHM",
                MediaGuardError::Computation { .. } => "COMPUTATION_FAILED",
                MediaGuardError::Embed(_) => "EMBED_FAILED",
                MediaGuardError::Extraction(_) => "EXTRACTION_FAILED",
                MediaGuardError::NotFound(_) => "NOT_FOUND",
                MediaGuardError::Store(_) => "STORE_ERROR",
                MediaGuardError::PartialRecording { .. } => "PARTIAL_RECORDING",
            },
        }
    }

    /// Get sanitized error message for client response
    fn client_message(&self) -> String {
        match self {
            // Algorithm names and lookups are safe to echo back; plugin and
            // store internals are not.
            Self::MediaGuard(ref e) => match e {
                MediaGuardError::InvalidConfiguration(msg) => {
                    format!("Invalid configuration: {}", msg)
                }
                MediaGuardError::UnknownAlgorithm { capability, name } => {
                    format!("Unknown {} algorithm '{}'", capability, name)
                }
                MediaGuardError::NotFound(msg) => format!("Not found: {}", msg),
                MediaGuardError::DuplicateAlgorithm(_) => {
                    "Algorithm registry misconfigured".to_string()
                }
                MediaGuardError::Computation { algorithm, .. } => {
                    format!("Algorithm '{}' failed to process the media", algorithm)
                }
                MediaGuardError::Embed(_) => "Watermark embedding failed".to_string(),
                MediaGuardError::Extraction(_) => {
                    "Watermark could not be read from the media".to_string()
                }
                MediaGuardError::Store(_) => "Storage error".to_string(),
                MediaGuardError::PartialRecording { .. } => {
                    "Watermark applied but not recorded".to_string()
                }
            },
            // For other errors, use the Display message
            _ => self.to_string(),
        }
    }

    /// Get the error category for logging
    fn error_category(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal",
            Self::ServiceUnavailable(_) => "service_unavailable",
            Self::MediaGuard(_) => "mediaguard",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let category = self.error_category();
        let code = self.error_code();
        let internal_message = self.to_string();
        let client_message = self.client_message();

        // Log based on severity, always including internal details
        if status.is_server_error() {
            tracing::error!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                client_message = %client_message,
                "Server error"
            );
        } else {
            tracing::warn!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Client error"
            );
        }

        // All error responses include a `code` field for programmatic error handling
        let body = serde_json::json!({
            "error": client_message,
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}
