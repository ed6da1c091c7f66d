//! Durable SQLite-backed job queue.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, params};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BackendError, StorageError, StorageResult};
use crate::tenant::TenantId;

use super::job::{JobId, JobRecord, JobStatus};

const BACKEND_NAME: &str = "sqlite-queue";

/// Configuration for the SQLite job queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection timeout in milliseconds.
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,

    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_connection_timeout_ms() -> u64 {
    30000
}

fn default_busy_timeout_ms() -> u32 {
    5000
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            connection_timeout_ms: default_connection_timeout_ms(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

/// Durable job queue backed by SQLite.
///
/// Queue state survives process restart: an enqueued-but-not-yet-run job is
/// recovered on the next start and resumed, never silently dropped. Claims
/// run inside a transaction so a job instance is picked up by exactly one
/// worker (at-most-once dispatch; retry gives at-least-once execution).
pub struct SqliteJobQueue {
    pool: Pool<SqliteConnectionManager>,
}

impl std::fmt::Debug for SqliteJobQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteJobQueue")
            .field("pool_state", &self.pool.state())
            .finish_non_exhaustive()
    }
}

impl SqliteJobQueue {
    /// Creates an in-memory queue (useful for tests; not durable).
    pub fn in_memory() -> StorageResult<Self> {
        // A pooled :memory: database is one database per connection, so
        // the in-memory mode pins the pool to a single connection.
        Self::with_config(
            ":memory:",
            QueueConfig {
                max_connections: 1,
                ..QueueConfig::default()
            },
        )
    }

    /// Opens or creates a file-based queue database.
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        Self::with_config(path, QueueConfig::default())
    }

    /// Creates a queue with custom configuration.
    pub fn with_config<P: AsRef<Path>>(path: P, config: QueueConfig) -> StorageResult<Self> {
        let busy_timeout = config.busy_timeout_ms;
        let manager = SqliteConnectionManager::file(path.as_ref()).with_init(move |conn| {
            conn.execute_batch(&format!(
                "PRAGMA journal_mode=WAL; PRAGMA busy_timeout={}; PRAGMA synchronous=NORMAL;",
                busy_timeout
            ))
        });

        let pool = Pool::builder()
            .max_size(config.max_connections)
            .connection_timeout(std::time::Duration::from_millis(config.connection_timeout_ms))
            .build(manager)
            .map_err(|e| {
                StorageError::Backend(BackendError::ConnectionFailed {
                    backend_name: BACKEND_NAME.to_string(),
                    message: e.to_string(),
                })
            })?;

        Ok(Self { pool })
    }

    /// Creates the jobs table and indexes if they do not exist.
    pub fn init_schema(&self) -> StorageResult<()> {
        let conn = self.get_connection()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS jobs (
                 id          TEXT PRIMARY KEY,
                 tenant_id   TEXT NOT NULL,
                 kind        TEXT NOT NULL,
                 payload     TEXT NOT NULL,
                 status      TEXT NOT NULL,
                 attempts    INTEGER NOT NULL DEFAULT 0,
                 error       TEXT,
                 enqueued_at TEXT NOT NULL,
                 next_run_at TEXT NOT NULL,
                 updated_at  TEXT NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_jobs_due
                 ON jobs (status, next_run_at);",
        )
        .map_err(|e| internal_error(format!("Failed to init schema: {}", e)))?;
        Ok(())
    }

    /// Persists a new job record.
    pub fn enqueue(&self, record: &JobRecord) -> StorageResult<()> {
        let conn = self.get_connection()?;
        conn.execute(
            "INSERT INTO jobs (id, tenant_id, kind, payload, status, attempts, error, enqueued_at, next_run_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.id.as_str(),
                record.tenant_id.as_str(),
                record.kind,
                record.payload,
                record.status.to_string(),
                record.attempts,
                record.error,
                record.enqueued_at.to_rfc3339(),
                record.next_run_at.to_rfc3339(),
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e| internal_error(format!("Failed to enqueue job: {}", e)))?;

        debug!(
            job_id = %record.id,
            tenant_id = %record.tenant_id,
            kind = %record.kind,
            "Enqueued job"
        );
        Ok(())
    }

    /// Atomically claims the next due job, flipping it to `running`.
    ///
    /// Returns `None` when no job is due. The select-and-update runs in a
    /// single transaction, which is the mutual-exclusion discipline that
    /// keeps a job instance on exactly one worker.
    pub fn claim_next(&self, now: DateTime<Utc>) -> StorageResult<Option<JobRecord>> {
        let mut conn = self.get_connection()?;
        let tx = conn
            .transaction()
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;

        let claimed = tx
            .query_row(
                "SELECT id, tenant_id, kind, payload, status, attempts, error, enqueued_at, next_run_at
                 FROM jobs
                 WHERE status = 'enqueued' AND next_run_at <= ?1
                 ORDER BY next_run_at
                 LIMIT 1",
                params![now.to_rfc3339()],
                row_to_record,
            )
            .optional()
            .map_err(|e| internal_error(format!("Failed to select due job: {}", e)))?;

        let Some(mut record) = claimed else {
            return Ok(None);
        };

        tx.execute(
            "UPDATE jobs SET status = 'running', updated_at = ?2 WHERE id = ?1",
            params![record.id.as_str(), now.to_rfc3339()],
        )
        .map_err(|e| internal_error(format!("Failed to claim job: {}", e)))?;
        tx.commit()
            .map_err(|e| internal_error(format!("Failed to commit claim: {}", e)))?;

        record.status = JobStatus::Running;
        Ok(Some(record))
    }

    /// Records a successful execution.
    pub fn mark_succeeded(&self, id: &JobId, attempts: u32) -> StorageResult<()> {
        self.transition(id, JobStatus::Succeeded, attempts, None, None)
    }

    /// Requeues a job after a transient failure, due again at `next_run_at`.
    pub fn mark_retry(
        &self,
        id: &JobId,
        attempts: u32,
        next_run_at: DateTime<Utc>,
        error: &str,
    ) -> StorageResult<()> {
        self.transition(id, JobStatus::Enqueued, attempts, Some(error), Some(next_run_at))
    }

    /// Moves a job to the terminal failed state.
    pub fn mark_failed(&self, id: &JobId, attempts: u32, error: &str) -> StorageResult<()> {
        self.transition(id, JobStatus::Failed, attempts, Some(error), None)
    }

    fn transition(
        &self,
        id: &JobId,
        status: JobStatus,
        attempts: u32,
        error: Option<&str>,
        next_run_at: Option<DateTime<Utc>>,
    ) -> StorageResult<()> {
        let conn = self.get_connection()?;
        let now = Utc::now();
        let updated = conn
            .execute(
                "UPDATE jobs
                 SET status = ?2, attempts = ?3, error = ?4, next_run_at = ?5, updated_at = ?6
                 WHERE id = ?1",
                params![
                    id.as_str(),
                    status.to_string(),
                    attempts,
                    error,
                    next_run_at.unwrap_or(now).to_rfc3339(),
                    now.to_rfc3339(),
                ],
            )
            .map_err(|e| internal_error(format!("Failed to update job: {}", e)))?;

        if updated == 0 {
            return Err(StorageError::Job(crate::error::JobError::NotFound {
                job_id: id.as_str().to_string(),
            }));
        }
        Ok(())
    }

    /// Fetches a job record by ID.
    pub fn get(&self, id: &JobId) -> StorageResult<Option<JobRecord>> {
        let conn = self.get_connection()?;
        conn.query_row(
            "SELECT id, tenant_id, kind, payload, status, attempts, error, enqueued_at, next_run_at
             FROM jobs WHERE id = ?1",
            params![id.as_str()],
            row_to_record,
        )
        .optional()
        .map_err(|e| internal_error(format!("Failed to read job: {}", e)))
    }

    /// Counts jobs, optionally filtered by status.
    pub fn count(&self, status: Option<JobStatus>) -> StorageResult<u64> {
        let conn = self.get_connection()?;
        let count: i64 = match status {
            Some(status) => conn
                .query_row(
                    "SELECT COUNT(*) FROM jobs WHERE status = ?1",
                    params![status.to_string()],
                    |row| row.get(0),
                )
                .map_err(|e| internal_error(format!("Failed to count jobs: {}", e)))?,
            None => conn
                .query_row("SELECT COUNT(*) FROM jobs", [], |row| row.get(0))
                .map_err(|e| internal_error(format!("Failed to count jobs: {}", e)))?,
        };
        Ok(count as u64)
    }

    /// Requeues jobs left in `running` by a crashed process.
    ///
    /// Called once at startup, before any worker polls. Re-running a job
    /// that had partially executed is the at-least-once half of the
    /// delivery contract.
    pub fn recover_interrupted(&self) -> StorageResult<u64> {
        let conn = self.get_connection()?;
        let recovered = conn
            .execute(
                "UPDATE jobs SET status = 'enqueued', updated_at = ?1 WHERE status = 'running'",
                params![Utc::now().to_rfc3339()],
            )
            .map_err(|e| internal_error(format!("Failed to recover jobs: {}", e)))?;
        Ok(recovered as u64)
    }

    /// Deletes terminal jobs whose last transition is older than the window.
    pub fn purge_terminal(&self, older_than: Duration) -> StorageResult<u64> {
        let conn = self.get_connection()?;
        let cutoff = (Utc::now() - older_than).to_rfc3339();
        let purged = conn
            .execute(
                "DELETE FROM jobs
                 WHERE status IN ('succeeded', 'failed') AND updated_at < ?1",
                params![cutoff],
            )
            .map_err(|e| internal_error(format!("Failed to purge jobs: {}", e)))?;
        Ok(purged as u64)
    }

    fn get_connection(&self) -> StorageResult<PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(|_| {
            StorageError::Backend(BackendError::PoolExhausted {
                backend_name: BACKEND_NAME.to_string(),
            })
        })
    }
}

fn internal_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::Internal {
        backend_name: BACKEND_NAME.to_string(),
        message,
    })
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<JobRecord> {
    let status: String = row.get(4)?;
    let status = status
        .parse::<JobStatus>()
        .map_err(|e| conversion_error(4, e))?;

    Ok(JobRecord {
        id: JobId::new(row.get::<_, String>(0)?),
        tenant_id: TenantId::new(row.get::<_, String>(1)?),
        kind: row.get(2)?,
        payload: row.get(3)?,
        status,
        attempts: row.get(5)?,
        error: row.get(6)?,
        enqueued_at: parse_timestamp(row.get::<_, String>(7)?, 7)?,
        next_run_at: parse_timestamp(row.get::<_, String>(8)?, 8)?,
    })
}

fn parse_timestamp(raw: String, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(column, e.to_string()))
}

fn conversion_error(column: usize, message: impl Into<String>) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        std::io::Error::new(std::io::ErrorKind::InvalidData, message.into()).into(),
    )
}
