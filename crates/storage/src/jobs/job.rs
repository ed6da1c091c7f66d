//! Job records and lifecycle types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tenant::TenantId;

/// Unique identifier for an enqueued job.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generates a fresh job ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wraps an existing identifier (e.g. read back from the queue).
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JobId({})", self.0)
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lifecycle state of a job.
///
/// `Enqueued → Running → Succeeded | Failed`. A retryable failure moves the
/// job back to `Enqueued` with its attempt count incremented and its next
/// run pushed out by the dispatcher's backoff; a terminal failure moves it
/// straight to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    /// Waiting in the queue (initial state, and the state after a
    /// retryable failure).
    Enqueued,
    /// Claimed by a worker and executing.
    Running,
    /// Completed successfully (terminal).
    Succeeded,
    /// Failed terminally - non-retryable error or retry budget exhausted.
    Failed,
}

impl JobStatus {
    /// Returns `true` if the status is terminal (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }

    /// Returns `true` if the job is still in flight.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Enqueued => write!(f, "enqueued"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Succeeded => write!(f, "succeeded"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enqueued" => Ok(JobStatus::Enqueued),
            "running" => Ok(JobStatus::Running),
            "succeeded" => Ok(JobStatus::Succeeded),
            "failed" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status: {}", other)),
        }
    }
}

/// A persisted unit of deferred work.
///
/// The tenant id is snapshot-captured at enqueue time - jobs never inherit
/// an ambient context that may have changed or disappeared by execution
/// time. The payload is an opaque reference (typically a blob key or
/// document id) resolved by the job body at execution time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Unique job identifier.
    pub id: JobId,
    /// Tenant captured when the job was enqueued.
    pub tenant_id: TenantId,
    /// Operation type; selects the registered handler.
    pub kind: String,
    /// Opaque payload reference, resolved by the handler.
    pub payload: String,
    /// Current lifecycle state.
    pub status: JobStatus,
    /// Number of completed execution attempts.
    pub attempts: u32,
    /// Message from the most recent failure, if any.
    pub error: Option<String>,
    /// When the job was first enqueued.
    pub enqueued_at: DateTime<Utc>,
    /// Earliest time the job may (next) run.
    pub next_run_at: DateTime<Utc>,
}

impl JobRecord {
    /// Creates a new record ready to enqueue, due immediately.
    pub fn new(tenant_id: TenantId, kind: impl Into<String>, payload: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::generate(),
            tenant_id,
            kind: kind.into(),
            payload: payload.into(),
            status: JobStatus::Enqueued,
            attempts: 0,
            error: None,
            enqueued_at: now,
            next_run_at: now,
        }
    }
}
