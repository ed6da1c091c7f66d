//! Background job dispatcher with tenant-scoped execution.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::{JobError, StorageError, StorageResult};
use crate::tenant::scope;
use crate::tenant::TenantContext;

use super::job::{JobId, JobRecord};
use super::queue::SqliteJobQueue;

/// A unit of background work keyed by job kind.
///
/// The handler runs inside the tenant scope of the tenant that enqueued the
/// job, so storage calls made from `run` are already namespaced without the
/// handler piping the tenant around by hand.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// The job kind this handler executes (e.g. "process-document").
    fn kind(&self) -> &'static str;

    /// Executes one job attempt.
    ///
    /// Return a transient error to request a retry under the backoff
    /// policy; any other error moves the job to the terminal failed state.
    async fn run(&self, tenant: &TenantContext, payload: &str) -> StorageResult<()>;
}

/// Bounded exponential backoff for transient job failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total execution attempts before a job is failed (first run included).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound on any single retry delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Returns the delay before the retry following `failed_attempts`
    /// completed attempts: base * 2^(failed_attempts - 1), capped.
    pub fn delay_for(&self, failed_attempts: u32) -> Duration {
        let exponent = failed_attempts.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

/// Dispatches enqueued jobs to registered handlers on worker tasks.
///
/// The tenant is snapshotted into the job record at enqueue time and the
/// scope is rebound from that snapshot at execution time, so a job always
/// runs as the tenant that submitted it regardless of which worker picks it
/// up or when.
pub struct JobDispatcher {
    queue: Arc<SqliteJobQueue>,
    handlers: HashMap<&'static str, Arc<dyn JobHandler>>,
    retry: RetryPolicy,
    poll_interval: Duration,
    retention: Option<chrono::Duration>,
}

impl JobDispatcher {
    /// Creates a dispatcher over the given queue with the default retry
    /// policy and a 500ms poll interval.
    pub fn new(queue: Arc<SqliteJobQueue>) -> Self {
        Self {
            queue,
            handlers: HashMap::new(),
            retry: RetryPolicy::default(),
            poll_interval: Duration::from_millis(500),
            retention: None,
        }
    }

    /// Replaces the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replaces the worker poll interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Enables retention sweeping: terminal jobs older than the window are
    /// deleted by idle workers.
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = Some(chrono::Duration::milliseconds(retention.as_millis() as i64));
        self
    }

    /// Registers a handler for its job kind. Last registration wins.
    pub fn register(&mut self, handler: Arc<dyn JobHandler>) {
        self.handlers.insert(handler.kind(), handler);
    }

    /// Snapshots the tenant and persists a new job, due immediately.
    pub fn enqueue(
        &self,
        tenant: &TenantContext,
        kind: &str,
        payload: impl Into<String>,
    ) -> StorageResult<JobId> {
        let record = JobRecord::new(tenant.tenant_id().clone(), kind, payload);
        self.queue.enqueue(&record)?;
        Ok(record.id)
    }

    /// Claims and executes every currently-due job, returning how many ran.
    ///
    /// This is the single poll step the worker loop repeats; errors from
    /// job handlers are absorbed into the job's status and do not surface
    /// here.
    pub async fn run_pending(&self) -> StorageResult<u64> {
        let mut executed = 0;
        while let Some(job) = self.queue.claim_next(Utc::now())? {
            self.execute(job).await?;
            executed += 1;
        }
        Ok(executed)
    }

    async fn execute(&self, job: JobRecord) -> StorageResult<()> {
        let ctx = TenantContext::new(job.tenant_id.clone()).with_correlation_id(job.id.as_str());

        let outcome = match self.handlers.get(job.kind.as_str()) {
            Some(handler) => {
                let handler = Arc::clone(handler);
                let run_ctx = ctx.clone();
                let payload = job.payload.clone();
                match scope::bind(ctx, async move { handler.run(&run_ctx, &payload).await }).await {
                    Ok(result) => result,
                    Err(e) => Err(StorageError::Tenant(e)),
                }
            }
            None => Err(StorageError::Job(JobError::UnknownKind {
                kind: job.kind.clone(),
            })),
        };

        let attempts = job.attempts + 1;
        match outcome {
            Ok(()) => {
                info!(job_id = %job.id, kind = %job.kind, attempts, "Job succeeded");
                self.queue.mark_succeeded(&job.id, attempts)
            }
            Err(e) if e.is_transient() && attempts < self.retry.max_attempts => {
                let delay = self.retry.delay_for(attempts);
                let next_run_at = Utc::now() + chrono::Duration::milliseconds(delay.as_millis() as i64);
                warn!(
                    job_id = %job.id,
                    kind = %job.kind,
                    attempts,
                    retry_in_ms = delay.as_millis() as u64,
                    error = %e,
                    "Job failed transiently, scheduling retry"
                );
                self.queue
                    .mark_retry(&job.id, attempts, next_run_at, &e.to_string())
            }
            Err(e) => {
                error!(job_id = %job.id, kind = %job.kind, attempts, error = %e, "Job failed");
                self.queue.mark_failed(&job.id, attempts, &e.to_string())
            }
        }
    }

    /// Spawns `workers` polling tasks and returns a handle for shutdown.
    pub fn start(self: Arc<Self>, workers: usize) -> DispatcherHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handles = (0..workers.max(1))
            .map(|worker_id| {
                let dispatcher = Arc::clone(&self);
                let shutdown = shutdown_rx.clone();
                tokio::spawn(async move {
                    dispatcher.worker_loop(worker_id, shutdown).await;
                })
            })
            .collect();

        info!(workers = workers.max(1), "Job dispatcher started");
        DispatcherHandle {
            shutdown: shutdown_tx,
            workers: handles,
        }
    }

    async fn worker_loop(&self, worker_id: usize, mut shutdown: watch::Receiver<bool>) {
        debug!(worker_id, "Worker started");
        loop {
            match self.run_pending().await {
                Ok(0) => {}
                Ok(executed) => debug!(worker_id, executed, "Worker drained due jobs"),
                Err(e) => warn!(worker_id, error = %e, "Worker poll failed"),
            }

            if let Some(retention) = self.retention {
                match self.queue.purge_terminal(retention) {
                    Ok(0) => {}
                    Ok(purged) => debug!(worker_id, purged, "Swept terminal jobs"),
                    Err(e) => warn!(worker_id, error = %e, "Retention sweep failed"),
                }
            }

            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        debug!(worker_id, "Worker stopping");
                        return;
                    }
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }
}

/// Handle to a running dispatcher's worker tasks.
pub struct DispatcherHandle {
    shutdown: watch::Sender<bool>,
    workers: Vec<JoinHandle<()>>,
}

impl DispatcherHandle {
    /// Signals all workers to stop and waits for them to finish their
    /// current job, if any.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for handle in self.workers {
            let _ = handle.await;
        }
        info!("Job dispatcher stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::error::BackendError;
    use crate::jobs::job::JobStatus;
    use crate::tenant::TenantId;

    fn dispatcher() -> (Arc<SqliteJobQueue>, JobDispatcher) {
        let queue = Arc::new(SqliteJobQueue::in_memory().unwrap());
        queue.init_schema().unwrap();
        let dispatcher = JobDispatcher::new(Arc::clone(&queue)).with_retry_policy(RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        });
        (queue, dispatcher)
    }

    fn ctx(tenant: &str) -> TenantContext {
        TenantContext::new(TenantId::new(tenant))
    }

    struct RecordingHandler {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl JobHandler for RecordingHandler {
        fn kind(&self) -> &'static str {
            "record-tenant"
        }

        async fn run(&self, tenant: &TenantContext, _payload: &str) -> StorageResult<()> {
            // The ambient scope must agree with the snapshot handed in.
            let ambient = scope::current().map_err(StorageError::Tenant)?;
            assert_eq!(ambient.tenant_id(), tenant.tenant_id());
            self.seen
                .lock()
                .unwrap()
                .push(tenant.tenant_id().as_str().to_string());
            Ok(())
        }
    }

    struct FlakyHandler {
        failures_left: AtomicU32,
    }

    #[async_trait]
    impl JobHandler for FlakyHandler {
        fn kind(&self) -> &'static str {
            "flaky"
        }

        async fn run(&self, _tenant: &TenantContext, _payload: &str) -> StorageResult<()> {
            if self.failures_left.fetch_sub(1, Ordering::SeqCst) > 0 {
                return Err(StorageError::Backend(BackendError::Unavailable {
                    backend_name: "local-fs".to_string(),
                    message: "disk flapping".to_string(),
                }));
            }
            Ok(())
        }
    }

    struct TerminalHandler;

    #[async_trait]
    impl JobHandler for TerminalHandler {
        fn kind(&self) -> &'static str {
            "doomed"
        }

        async fn run(&self, _tenant: &TenantContext, _payload: &str) -> StorageResult<()> {
            Err(StorageError::terminal("payload failed validation"))
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(1),
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(250));
        assert_eq!(policy.delay_for(2), Duration::from_millis(500));
        assert_eq!(policy.delay_for(3), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(4), Duration::from_secs(1));
        assert_eq!(policy.delay_for(31), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_job_runs_as_enqueuing_tenant() {
        let (queue, mut dispatcher) = dispatcher();
        let handler = Arc::new(RecordingHandler {
            seen: Mutex::new(Vec::new()),
        });
        dispatcher.register(Arc::clone(&handler) as Arc<dyn JobHandler>);

        let job_id = dispatcher.enqueue(&ctx("acme"), "record-tenant", "p").unwrap();
        assert_eq!(dispatcher.run_pending().await.unwrap(), 1);

        assert_eq!(*handler.seen.lock().unwrap(), vec!["acme".to_string()]);
        let record = queue.get(&job_id).unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Succeeded);
        assert_eq!(record.attempts, 1);
    }

    #[tokio::test]
    async fn test_transient_failure_retries_then_succeeds() {
        let (queue, mut dispatcher) = dispatcher();
        dispatcher.register(Arc::new(FlakyHandler {
            failures_left: AtomicU32::new(1),
        }));

        let job_id = dispatcher.enqueue(&ctx("acme"), "flaky", "p").unwrap();

        // First poll fails transiently and requeues.
        assert_eq!(dispatcher.run_pending().await.unwrap(), 1);
        let record = queue.get(&job_id).unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Enqueued);
        assert_eq!(record.attempts, 1);
        assert!(record.error.is_some());

        // Second poll succeeds (zero backoff in tests, so due immediately).
        assert_eq!(dispatcher.run_pending().await.unwrap(), 1);
        let record = queue.get(&job_id).unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Succeeded);
        assert_eq!(record.attempts, 2);
    }

    #[tokio::test]
    async fn test_retry_budget_exhaustion_fails_job() {
        let (queue, mut dispatcher) = dispatcher();
        dispatcher.register(Arc::new(FlakyHandler {
            failures_left: AtomicU32::new(u32::MAX),
        }));

        let job_id = dispatcher.enqueue(&ctx("acme"), "flaky", "p").unwrap();
        for _ in 0..3 {
            dispatcher.run_pending().await.unwrap();
        }

        let record = queue.get(&job_id).unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Failed);
        assert_eq!(record.attempts, 3);
        assert!(queue.claim_next(Utc::now()).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_terminal_failure_consumes_one_attempt() {
        let (queue, mut dispatcher) = dispatcher();
        dispatcher.register(Arc::new(TerminalHandler));

        let job_id = dispatcher.enqueue(&ctx("acme"), "doomed", "p").unwrap();
        assert_eq!(dispatcher.run_pending().await.unwrap(), 1);

        let record = queue.get(&job_id).unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Failed);
        assert_eq!(record.attempts, 1);
        assert!(
            record
                .error
                .as_deref()
                .unwrap()
                .contains("payload failed validation")
        );
    }

    #[tokio::test]
    async fn test_unknown_kind_is_terminal() {
        let (queue, dispatcher) = dispatcher();
        let job_id = dispatcher.enqueue(&ctx("acme"), "no-such-kind", "p").unwrap();
        assert_eq!(dispatcher.run_pending().await.unwrap(), 1);

        let record = queue.get(&job_id).unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Failed);
        assert_eq!(record.attempts, 1);
        assert!(record.error.as_deref().unwrap().contains("no-such-kind"));
    }

    #[tokio::test]
    async fn test_start_and_shutdown_drains_jobs() {
        let (queue, mut dispatcher) = dispatcher();
        let handler = Arc::new(RecordingHandler {
            seen: Mutex::new(Vec::new()),
        });
        dispatcher.register(Arc::clone(&handler) as Arc<dyn JobHandler>);
        dispatcher = dispatcher.with_poll_interval(Duration::from_millis(10));

        let job_id = dispatcher.enqueue(&ctx("globex"), "record-tenant", "p").unwrap();
        let handle = Arc::new(dispatcher).start(2);

        // Wait for the workers to pick the job up.
        for _ in 0..100 {
            if queue.get(&job_id).unwrap().unwrap().status.is_terminal() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.shutdown().await;

        let record = queue.get(&job_id).unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Succeeded);
        assert_eq!(*handler.seen.lock().unwrap(), vec!["globex".to_string()]);
    }
}
