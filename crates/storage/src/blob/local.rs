//! Local filesystem blob backend.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::error::{BackendError, BlobError, StorageError, StorageResult, TenantError};
use crate::tenant::{TenantContext, TenantId, is_valid_tenant_id};

use super::key::BlobKey;
use super::store::BlobStore;

const BACKEND_NAME: &str = "local-fs";

/// Blob store backed by a single local directory tree.
///
/// Objects live at `<root>/<tenantId>/<blobKey>`; each tenant's directory
/// is created lazily on its first write. Saves publish through a
/// write-to-temp-then-rename sequence so readers never observe a partially
/// written object.
///
/// # Example
///
/// ```no_run
/// use vellum_storage::blob::LocalBlobStore;
///
/// let store = LocalBlobStore::new("data/blobs");
/// ```
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Creates a store rooted at the given directory.
    ///
    /// The root (and tenant subdirectories) are created on first write, so
    /// construction never touches the filesystem.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Composes the physical directory for a tenant's namespace.
    ///
    /// The tenant id is re-validated here even though contexts normally
    /// carry parsed ids: the path is the isolation boundary, so it is never
    /// composed from an id that could contain path components.
    fn tenant_dir(&self, tenant_id: &TenantId) -> StorageResult<PathBuf> {
        if !is_valid_tenant_id(tenant_id.as_str()) {
            return Err(StorageError::Tenant(TenantError::Invalid {
                tenant_id: tenant_id.as_str().to_string(),
                message: "tenant id is not a valid storage namespace".to_string(),
            }));
        }
        Ok(self.root.join(tenant_id.as_str()))
    }

    /// Composes the physical path of a blob. Internal only; never exposed
    /// to callers.
    fn blob_path(&self, tenant_id: &TenantId, key: &BlobKey) -> StorageResult<PathBuf> {
        Ok(self.tenant_dir(tenant_id)?.join(key.as_str()))
    }
}

fn io_error(source: std::io::Error) -> StorageError {
    StorageError::Backend(BackendError::io(BACKEND_NAME, source))
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn backend_name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn save(
        &self,
        tenant: &TenantContext,
        content: &[u8],
        name: &str,
    ) -> StorageResult<BlobKey> {
        let tenant_dir = self.tenant_dir(tenant.tenant_id())?;
        fs::create_dir_all(&tenant_dir).await.map_err(io_error)?;

        let key = BlobKey::generate(name);
        let final_path = tenant_dir.join(key.as_str());

        // Write to a temp file in the same directory, then rename to
        // publish. Rename within one directory is atomic on POSIX, so a
        // concurrent reader sees either nothing or the whole object.
        let tmp_path = tenant_dir.join(format!(".tmp-{}", Uuid::new_v4().simple()));
        if let Err(e) = fs::write(&tmp_path, content).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(io_error(e));
        }
        if let Err(e) = fs::rename(&tmp_path, &final_path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(io_error(e));
        }

        debug!(
            tenant_id = %tenant.tenant_id(),
            key = %key,
            bytes = content.len(),
            "Saved blob"
        );
        Ok(key)
    }

    async fn read(&self, tenant: &TenantContext, key: &BlobKey) -> StorageResult<Vec<u8>> {
        let path = self.blob_path(tenant.tenant_id(), key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::Blob(BlobError::NotFound {
                    tenant_id: tenant.tenant_id().clone(),
                    key: key.as_str().to_string(),
                }))
            }
            Err(e) => Err(io_error(e)),
        }
    }

    async fn delete(&self, tenant: &TenantContext, key: &BlobKey) -> StorageResult<()> {
        let path = self.blob_path(tenant.tenant_id(), key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(tenant_id = %tenant.tenant_id(), key = %key, "Deleted blob");
                Ok(())
            }
            // Idempotent: a missing key deletes to the same end state.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenant::TenantId;

    fn ctx(id: &str) -> TenantContext {
        TenantContext::new(TenantId::new(id))
    }

    fn store() -> (tempfile::TempDir, LocalBlobStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn test_save_read_roundtrip() {
        let (_dir, store) = store();
        let tenant = ctx("acme");

        let key = store.save(&tenant, b"hello world", "greeting.txt").await.unwrap();
        let bytes = store.read(&tenant, &key).await.unwrap();
        assert_eq!(bytes, b"hello world");
    }

    #[tokio::test]
    async fn test_layout_is_tenant_partitioned() {
        let (dir, store) = store();
        let tenant = ctx("acme");

        let key = store.save(&tenant, b"x", "a.bin").await.unwrap();
        let expected = dir.path().join("acme").join(key.as_str());
        assert!(expected.exists());
    }

    #[tokio::test]
    async fn test_read_missing_key_is_not_found() {
        let (_dir, store) = store();
        let tenant = ctx("acme");
        let key = BlobKey::generate("ghost.bin");

        let err = store.read(&tenant, &key).await.unwrap_err();
        assert!(matches!(err, StorageError::Blob(BlobError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_cross_tenant_read_is_not_found() {
        let (_dir, store) = store();

        let key = store.save(&ctx("acme"), b"secret", "doc.txt").await.unwrap();

        // Replaying acme's key under another tenant must not resolve, even
        // though the key string is identical.
        let err = store.read(&ctx("globex"), &key).await.unwrap_err();
        assert!(matches!(err, StorageError::Blob(BlobError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (_dir, store) = store();
        let tenant = ctx("acme");

        let key = store.save(&tenant, b"bye", "b.txt").await.unwrap();
        store.delete(&tenant, &key).await.unwrap();
        store.delete(&tenant, &key).await.unwrap();
        assert!(!store.exists(&tenant, &key).await.unwrap());
    }

    #[tokio::test]
    async fn test_invalid_tenant_id_is_rejected_before_io() {
        let (_dir, store) = store();
        let tenant = ctx("../escape");

        let err = store.save(&tenant, b"x", "a.txt").await.unwrap_err();
        assert!(matches!(err, StorageError::Tenant(TenantError::Invalid { .. })));
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let (dir, store) = store();
        let tenant = ctx("acme");
        store.save(&tenant, b"data", "c.txt").await.unwrap();

        let mut entries = tokio::fs::read_dir(dir.path().join("acme")).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            let name = entry.file_name();
            assert!(!name.to_string_lossy().starts_with(".tmp-"));
        }
    }
}
