//! Post-upload document processing job.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use vellum_storage::blob::{BlobKey, BlobStore};
use vellum_storage::jobs::JobHandler;
use vellum_storage::tenant::TenantContext;
use vellum_storage::{StorageError, StorageResult};

/// Job kind enqueued for every uploaded document.
pub const PROCESS_DOCUMENT_KIND: &str = "process-document";

/// Processes an uploaded document.
///
/// The payload is the blob key recorded at upload time; the blob is
/// resolved against the store at execution time under the tenant captured
/// in the job record. Transient storage failures are retried by the
/// dispatcher; a missing blob is a terminal failure.
pub struct ProcessDocumentHandler<S> {
    store: Arc<S>,
}

impl<S> ProcessDocumentHandler<S> {
    /// Creates a handler over the given blob store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: BlobStore> JobHandler for ProcessDocumentHandler<S> {
    fn kind(&self) -> &'static str {
        PROCESS_DOCUMENT_KIND
    }

    async fn run(&self, tenant: &TenantContext, payload: &str) -> StorageResult<()> {
        let key = BlobKey::parse(payload).map_err(StorageError::Blob)?;
        let content = self.store.read(tenant, &key).await?;

        info!(
            tenant_id = %tenant.tenant_id(),
            key = %key,
            size = content.len(),
            "Processed document"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_storage::blob::LocalBlobStore;
    use vellum_storage::tenant::TenantId;

    fn ctx(tenant: &str) -> TenantContext {
        TenantContext::new(TenantId::new(tenant))
    }

    #[tokio::test]
    async fn test_processes_existing_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalBlobStore::new(dir.path()));
        let tenant = ctx("acme");

        let key = store.save(&tenant, b"report body", "report.pdf").await.unwrap();

        let handler = ProcessDocumentHandler::new(Arc::clone(&store));
        assert!(handler.run(&tenant, key.as_str()).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_document_is_not_transient() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalBlobStore::new(dir.path()));
        let tenant = ctx("acme");

        let key = store.save(&tenant, b"bytes", "a.txt").await.unwrap();

        let handler = ProcessDocumentHandler::new(store);
        let err = handler.run(&ctx("globex"), key.as_str()).await.unwrap_err();
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_malformed_payload_is_terminal() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalBlobStore::new(dir.path()));

        let handler = ProcessDocumentHandler::new(store);
        let err = handler.run(&ctx("acme"), "../../etc/passwd").await.unwrap_err();
        assert!(!err.is_transient());
    }
}
