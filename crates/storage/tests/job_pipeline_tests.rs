//! Integration tests for the job pipeline: tenant snapshotting, durability
//! across restart, and blob-backed document processing.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use vellum_storage::blob::{BlobKey, BlobStore, LocalBlobStore};
use vellum_storage::jobs::{JobDispatcher, JobHandler, JobStatus, RetryPolicy, SqliteJobQueue};
use vellum_storage::tenant::{TenantContext, TenantId, scope};
use vellum_storage::{StorageError, StorageResult};

fn ctx(tenant: &str) -> TenantContext {
    TenantContext::new(TenantId::new(tenant))
}

fn in_memory_dispatcher() -> (Arc<SqliteJobQueue>, JobDispatcher) {
    let queue = Arc::new(SqliteJobQueue::in_memory().unwrap());
    queue.init_schema().unwrap();
    let dispatcher = JobDispatcher::new(Arc::clone(&queue)).with_retry_policy(RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::ZERO,
        max_delay: Duration::ZERO,
    });
    (queue, dispatcher)
}

/// Records which tenant each execution ran as, as seen from the ambient
/// scope rather than the handler argument.
struct ScopeProbe {
    seen: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl JobHandler for ScopeProbe {
    fn kind(&self) -> &'static str {
        "scope-probe"
    }

    async fn run(&self, _tenant: &TenantContext, payload: &str) -> StorageResult<()> {
        let ambient = scope::current().map_err(StorageError::Tenant)?;
        self.seen
            .lock()
            .unwrap()
            .push((payload.to_string(), ambient.tenant_id().as_str().to_string()));
        Ok(())
    }
}

/// Reads the blob named by the payload through the ambient tenant scope,
/// the same shape as the real document processor.
struct BlobReader {
    store: Arc<LocalBlobStore>,
}

#[async_trait]
impl JobHandler for BlobReader {
    fn kind(&self) -> &'static str {
        "read-blob"
    }

    async fn run(&self, tenant: &TenantContext, payload: &str) -> StorageResult<()> {
        let key = BlobKey::parse(payload).map_err(StorageError::Blob)?;
        let content = self.store.read(tenant, &key).await?;
        if content.is_empty() {
            return Err(StorageError::terminal("blob is empty"));
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_interleaved_jobs_each_run_as_their_own_tenant() {
    let (_queue, mut dispatcher) = in_memory_dispatcher();
    let probe = Arc::new(ScopeProbe {
        seen: Mutex::new(Vec::new()),
    });
    dispatcher.register(Arc::clone(&probe) as Arc<dyn JobHandler>);

    dispatcher.enqueue(&ctx("acme"), "scope-probe", "job-a").unwrap();
    dispatcher.enqueue(&ctx("globex"), "scope-probe", "job-g").unwrap();
    dispatcher.enqueue(&ctx("acme"), "scope-probe", "job-a2").unwrap();

    assert_eq!(dispatcher.run_pending().await.unwrap(), 3);

    let seen = probe.seen.lock().unwrap();
    for (payload, tenant) in seen.iter() {
        let expected = if payload.starts_with("job-a") { "acme" } else { "globex" };
        assert_eq!(tenant, expected, "job {} ran as wrong tenant", payload);
    }
    assert_eq!(seen.len(), 3);
}

#[tokio::test]
async fn test_queue_survives_reopen_with_interrupted_job() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("jobs.db");

    let pending_id = {
        let queue = SqliteJobQueue::open(&db_path).unwrap();
        queue.init_schema().unwrap();
        let dispatcher = JobDispatcher::new(Arc::new(SqliteJobQueue::open(&db_path).unwrap()));
        let id = dispatcher.enqueue(&ctx("acme"), "scope-probe", "held").unwrap();
        // Claim it so the row sits in `running` when the process "dies".
        queue.claim_next(Utc::now()).unwrap().unwrap();
        id
    };

    // Restart: reopen the database and recover interrupted work.
    let queue = Arc::new(SqliteJobQueue::open(&db_path).unwrap());
    queue.init_schema().unwrap();
    assert_eq!(queue.recover_interrupted().unwrap(), 1);

    let record = queue.get(&pending_id).unwrap().unwrap();
    assert_eq!(record.status, JobStatus::Enqueued);
    assert_eq!(record.tenant_id.as_str(), "acme");

    let probe = Arc::new(ScopeProbe {
        seen: Mutex::new(Vec::new()),
    });
    let mut dispatcher = JobDispatcher::new(Arc::clone(&queue));
    dispatcher.register(Arc::clone(&probe) as Arc<dyn JobHandler>);
    assert_eq!(dispatcher.run_pending().await.unwrap(), 1);
    assert_eq!(
        *probe.seen.lock().unwrap(),
        vec![("held".to_string(), "acme".to_string())]
    );
}

#[tokio::test]
async fn test_blob_job_cannot_reach_another_tenants_blob() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(LocalBlobStore::new(dir.path()));

    let acme = ctx("acme");
    let key = store.save(&acme, b"acme report", "report.pdf").await.unwrap();

    let (queue, mut dispatcher) = in_memory_dispatcher();
    dispatcher.register(Arc::new(BlobReader {
        store: Arc::clone(&store),
    }));

    // Same key enqueued by the owner and by another tenant.
    let owner_job = dispatcher.enqueue(&acme, "read-blob", key.as_str()).unwrap();
    let intruder_job = dispatcher
        .enqueue(&ctx("globex"), "read-blob", key.as_str())
        .unwrap();

    assert_eq!(dispatcher.run_pending().await.unwrap(), 2);

    assert_eq!(
        queue.get(&owner_job).unwrap().unwrap().status,
        JobStatus::Succeeded
    );
    let intruder = queue.get(&intruder_job).unwrap().unwrap();
    assert_eq!(intruder.status, JobStatus::Failed);
    assert!(intruder.error.as_deref().unwrap().contains("not found"));
}
