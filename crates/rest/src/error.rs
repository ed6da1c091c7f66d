//! Error types for the Vellum HTTP API.
//!
//! This module defines all error types used throughout the REST layer, with
//! automatic conversion to JSON error responses.
//!
//! # Error Mapping
//!
//! Storage errors from the storage layer are automatically mapped to
//! appropriate HTTP status codes:
//!
//! | Storage Error | HTTP Status |
//! |--------------|-------------|
//! | TenantError::Missing | 400 |
//! | TenantError::Invalid | 400 |
//! | BlobError::NotFound | 404 |
//! | BlobError::InvalidKey | 400 |
//! | JobError::NotFound | 404 |
//! | BackendError::Unavailable / PoolExhausted | 503 |
//! | everything else | 500 |
//!
//! Internal detail (filesystem paths, job state, backend names) never leaks
//! into response bodies; it is logged instead.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;
use tracing::error;
use vellum_storage::error::{BackendError, BlobError, JobError, StorageError, TenantError};

/// The primary error type for REST API operations.
///
/// This enum provides semantic error types that map cleanly to HTTP status
/// codes and JSON error bodies.
#[derive(Debug)]
pub enum ApiError {
    /// No tenant identifier could be resolved for the request (HTTP 400).
    MissingTenant,

    /// Bad request - validation error (HTTP 400).
    BadRequest {
        /// Error message.
        message: String,
    },

    /// Resource not found (HTTP 404).
    NotFound {
        /// What kind of thing was looked up (e.g. "Document").
        kind: &'static str,
    },

    /// Request body exceeded the configured limit (HTTP 413).
    PayloadTooLarge,

    /// A storage backend is temporarily unavailable (HTTP 503).
    ServiceUnavailable,

    /// Internal server error (HTTP 500).
    InternalError {
        /// Error message (logged, not returned to the client).
        message: String,
    },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::MissingTenant => write!(f, "Missing tenant identifier"),
            ApiError::BadRequest { message } => write!(f, "Bad request: {}", message),
            ApiError::NotFound { kind } => write!(f, "{} not found", kind),
            ApiError::PayloadTooLarge => write!(f, "Payload too large"),
            ApiError::ServiceUnavailable => write!(f, "Service unavailable"),
            ApiError::InternalError { message } => write!(f, "Internal error: {}", message),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::MissingTenant => {
                (StatusCode::BAD_REQUEST, "Missing tenant identifier".to_string())
            }
            ApiError::BadRequest { message } => (StatusCode::BAD_REQUEST, message.clone()),
            ApiError::NotFound { kind } => (StatusCode::NOT_FOUND, format!("{} not found", kind)),
            ApiError::PayloadTooLarge => {
                (StatusCode::PAYLOAD_TOO_LARGE, "Payload too large".to_string())
            }
            ApiError::ServiceUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service temporarily unavailable".to_string(),
            ),
            ApiError::InternalError { message } => {
                // The message stays in the logs; the client gets an opaque body.
                error!(error = %message, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(serde_json::json!({ "error": body }))).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Tenant(e) => e.into(),
            StorageError::Blob(e) => e.into(),
            StorageError::Job(e) => e.into(),
            StorageError::Backend(e) => e.into(),
        }
    }
}

impl From<TenantError> for ApiError {
    fn from(err: TenantError) -> Self {
        match err {
            TenantError::Missing => ApiError::MissingTenant,
            TenantError::Invalid { .. } => ApiError::BadRequest {
                message: err.to_string(),
            },
            // Scope misuse is a server defect, never a client problem.
            TenantError::ScopeNotBound | TenantError::ScopeAlreadyBound { .. } => {
                ApiError::InternalError {
                    message: err.to_string(),
                }
            }
        }
    }
}

impl From<BlobError> for ApiError {
    fn from(err: BlobError) -> Self {
        match err {
            BlobError::NotFound { .. } => ApiError::NotFound { kind: "Document" },
            BlobError::InvalidKey { .. } => ApiError::BadRequest {
                message: err.to_string(),
            },
        }
    }
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::NotFound { .. } => ApiError::NotFound { kind: "Job" },
            JobError::UnknownKind { .. } | JobError::Terminal { .. } => ApiError::InternalError {
                message: err.to_string(),
            },
        }
    }
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Unavailable { .. }
            | BackendError::ConnectionFailed { .. }
            | BackendError::PoolExhausted { .. } => {
                error!(error = %err, "Storage backend unavailable");
                ApiError::ServiceUnavailable
            }
            _ => ApiError::InternalError {
                message: err.to_string(),
            },
        }
    }
}

/// Result type alias for REST operations.
pub type ApiResult<T> = Result<T, ApiError>;
