//! Error types for the storage layer.
//!
//! This module defines all error types used throughout the storage layer,
//! following a hierarchy that separates tenant errors, blob errors, job
//! errors, and backend errors.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

use crate::tenant::TenantId;

/// The primary error type for all storage operations.
///
/// This enum encompasses all possible errors that can occur during blob or
/// job operations, organized by category.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Tenant isolation and context errors
    #[error(transparent)]
    Tenant(#[from] TenantError),

    /// Blob storage errors
    #[error(transparent)]
    Blob(#[from] BlobError),

    /// Job pipeline errors
    #[error(transparent)]
    Job(#[from] JobError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Convenience alias for storage operation results.
pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    /// Returns `true` if this error is presumed recoverable and worth
    /// retrying under the dispatcher's backoff policy.
    ///
    /// Everything else is treated as terminal: tenant violations, missing
    /// blobs, and invalid payloads do not become valid by waiting.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StorageError::Backend(
                BackendError::Io { .. }
                    | BackendError::Unavailable { .. }
                    | BackendError::ConnectionFailed { .. }
                    | BackendError::PoolExhausted { .. }
            )
        )
    }

    /// Creates a terminal job failure with the given message.
    pub fn terminal(message: impl Into<String>) -> Self {
        StorageError::Job(JobError::Terminal {
            message: message.into(),
        })
    }
}

/// Errors related to tenant isolation and the tenant scope.
#[derive(Error, Debug)]
pub enum TenantError {
    /// No tenant identifier could be resolved for the operation.
    #[error("missing tenant identifier")]
    Missing,

    /// The supplied tenant identifier is not valid.
    #[error("invalid tenant identifier: {tenant_id}")]
    Invalid { tenant_id: String, message: String },

    /// Code read the tenant scope outside any bound scope. This is a
    /// programming defect, never an empty tenant.
    #[error("no tenant bound to the current scope")]
    ScopeNotBound,

    /// Code attempted to rebind an already-bound scope to a different
    /// tenant mid-operation.
    #[error("tenant scope already bound to {current}, refusing rebind to {attempted}")]
    ScopeAlreadyBound {
        current: TenantId,
        attempted: TenantId,
    },
}

/// Errors related to blob storage.
#[derive(Error, Debug)]
pub enum BlobError {
    /// The requested blob does not exist under the tenant's namespace.
    #[error("blob not found: {key} (tenant {tenant_id})")]
    NotFound { tenant_id: TenantId, key: String },

    /// The supplied blob key is malformed.
    #[error("invalid blob key {key:?}: {message}")]
    InvalidKey { key: String, message: String },
}

/// Errors related to the job pipeline.
#[derive(Error, Debug)]
pub enum JobError {
    /// The requested job record does not exist.
    #[error("job not found: {job_id}")]
    NotFound { job_id: String },

    /// No handler is registered for the job's kind.
    #[error("no handler registered for job kind {kind:?}")]
    UnknownKind { kind: String },

    /// Non-retryable processing failure. Moves the job directly to the
    /// terminal failed state without consuming retry budget.
    #[error("terminal job failure: {message}")]
    Terminal { message: String },
}

/// Errors originating from a storage backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend is currently unavailable.
    #[error("backend unavailable: {backend_name}: {message}")]
    Unavailable {
        backend_name: String,
        message: String,
    },

    /// Connection to the backend failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// Connection pool exhausted.
    #[error("connection pool exhausted for {backend_name}")]
    PoolExhausted { backend_name: String },

    /// An I/O operation failed.
    #[error("i/o failure in {backend_name}")]
    Io {
        backend_name: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization or deserialization failed.
    #[error("serialization failure: {message}")]
    Serialization { message: String },

    /// An internal backend invariant was violated.
    #[error("internal failure in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
    },
}

impl BackendError {
    /// Wraps an I/O error for the named backend.
    pub fn io(backend_name: &str, source: std::io::Error) -> Self {
        BackendError::Io {
            backend_name: backend_name.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_errors_are_transient() {
        let err = StorageError::Backend(BackendError::io(
            "local-fs",
            std::io::Error::new(std::io::ErrorKind::TimedOut, "disk hiccup"),
        ));
        assert!(err.is_transient());

        let err = StorageError::Backend(BackendError::Unavailable {
            backend_name: "sqlite-queue".to_string(),
            message: "locked".to_string(),
        });
        assert!(err.is_transient());
    }

    #[test]
    fn test_domain_errors_are_not_transient() {
        let not_found = StorageError::Blob(BlobError::NotFound {
            tenant_id: TenantId::new("acme"),
            key: "abc".to_string(),
        });
        assert!(!not_found.is_transient());

        assert!(!StorageError::terminal("payload gone").is_transient());
        assert!(!StorageError::Tenant(TenantError::ScopeNotBound).is_transient());
    }

    #[test]
    fn test_terminal_helper_message() {
        let err = StorageError::terminal("virus scanner rejected file");
        assert!(err.to_string().contains("virus scanner rejected file"));
    }

    #[test]
    fn test_error_display_includes_tenant() {
        let err = BlobError::NotFound {
            tenant_id: TenantId::new("acme"),
            key: "deadbeef-report.pdf".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("acme"));
        assert!(msg.contains("deadbeef-report.pdf"));
    }
}
