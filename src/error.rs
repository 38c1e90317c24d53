//! Error types for tardis-dl
//!
//! This module provides error handling for the service, including:
//! - Domain-specific error types (Validation, Job, Database, Download)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for tardis-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for tardis-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "database_path")
        key: Option<String>,
    },

    /// Request validation failed for a specific field
    #[error("invalid {field}: {message}")]
    Validation {
        /// The request field that failed validation
        field: &'static str,
        /// Why the field was rejected
        message: String,
    },

    /// Caller identity or token missing/invalid
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller identity present but not allowed
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Job-related error
    #[error("job error: {0}")]
    Job(#[from] JobError),

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// Download execution error (delegated fetch failed)
    #[error("download error: {0}")]
    Download(#[from] DownloadError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Job-related errors
#[derive(Debug, Error)]
pub enum JobError {
    /// Job not found in the database
    #[error("job {id} not found")]
    NotFound {
        /// The job ID that was not found
        id: i64,
    },
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),
}

/// Download execution errors raised by the delegated fetcher
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Upstream returned a non-success HTTP status
    #[error("upstream returned {status} for {url}")]
    UpstreamStatus {
        /// HTTP status code returned by the upstream provider
        status: u16,
        /// The dataset URL that failed
        url: String,
    },

    /// Request to the upstream provider failed
    #[error("upstream request failed: {0}")]
    Request(String),

    /// Writing a downloaded file to disk failed
    #[error("failed to write {path}: {reason}")]
    WriteFailed {
        /// Destination path of the file being written
        path: String,
        /// Why the write failed
        reason: String,
    },

    /// No Tardis API key configured
    #[error("no upstream API key configured")]
    MissingApiKey,
}

/// API error response format
///
/// Returned by API endpoints when an error occurs, with a machine-readable
/// error code, a human-readable message, and optional contextual details.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "not_found",
///     "message": "job 123 not found",
///     "details": {
///       "job_id": 123
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "validation_error")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create a "not found" error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("not_found", format!("{} not found", resource.into()))
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an "unauthorized" error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("unauthorized", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::Validation { .. } => 400,

            // 401 / 403 - Authentication and authorization
            Error::Unauthorized(_) => 401,
            Error::Forbidden(_) => 403,

            // 404 Not Found
            Error::Job(JobError::NotFound { .. }) => 404,

            // 500 Internal Server Error - Server-side issues
            Error::Database(_) => 500,
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Serialization(_) => 500,
            Error::Other(_) => 500,

            // 502 Bad Gateway - External service errors
            Error::Download(_) => 502,
            Error::Network(_) => 502,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Validation { .. } => "validation_error",
            Error::Unauthorized(_) => "unauthorized",
            Error::Forbidden(_) => "forbidden",
            Error::Job(JobError::NotFound { .. }) => "job_not_found",
            Error::Database(_) => "database_error",
            Error::Download(_) => "download_error",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        // Add contextual details for specific error types
        let details = match &error {
            Error::Validation { field, .. } => Some(serde_json::json!({
                "field": field,
            })),
            Error::Job(JobError::NotFound { id }) => Some(serde_json::json!({
                "job_id": id,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
