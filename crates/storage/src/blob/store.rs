//! Core blob storage trait.
//!
//! This module defines the [`BlobStore`] trait, the capability interface for
//! persisting opaque binary payloads. All operations require a
//! [`TenantContext`] to ensure proper tenant isolation.

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::tenant::TenantContext;

use super::key::BlobKey;

/// Capability interface for tenant-partitioned blob persistence.
///
/// The local filesystem backend is the only implementation today; the trait
/// exists so an object-storage backend can be substituted without touching
/// callers.
///
/// # Tenant Isolation
///
/// Every operation takes a [`TenantContext`] as its first parameter, and no
/// API accepts a bare key without one. Physical addresses are derived by
/// composing the tenant identifier into the storage path before any key is
/// resolved, so cross-tenant access is structurally impossible - a key
/// replayed under another tenant resolves inside that tenant's (empty)
/// namespace and reads as not-found.
///
/// # Example
///
/// ```ignore
/// use vellum_storage::blob::BlobStore;
/// use vellum_storage::tenant::{TenantContext, TenantId};
///
/// async fn example<S: BlobStore>(store: &S) -> vellum_storage::StorageResult<()> {
///     let tenant = TenantContext::new(TenantId::new("acme"));
///
///     let key = store.save(&tenant, b"contract text", "contract.pdf").await?;
///     let bytes = store.read(&tenant, &key).await?;
///     assert_eq!(bytes, b"contract text");
///
///     store.delete(&tenant, &key).await?;
///     store.delete(&tenant, &key).await?; // idempotent
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Returns a human-readable name for this storage backend.
    fn backend_name(&self) -> &'static str;

    /// Persists `content` under a freshly generated key.
    ///
    /// `name` is the caller-supplied original filename; it is folded into
    /// the returned key for traceability only and plays no part in lookup.
    ///
    /// The write is atomic from a reader's perspective: a concurrent
    /// reader never observes a partially written object. Each save gets a
    /// fresh collision-resistant key, so parallel saves for the same tenant
    /// never contend.
    ///
    /// # Errors
    ///
    /// * `StorageError::Tenant` - if the context carries an invalid tenant id
    /// * `StorageError::Backend` - on I/O failure (classified transient)
    async fn save(
        &self,
        tenant: &TenantContext,
        content: &[u8],
        name: &str,
    ) -> StorageResult<BlobKey>;

    /// Reads the blob stored under `key` in the tenant's namespace.
    ///
    /// # Errors
    ///
    /// * `StorageError::Blob(NotFound)` - if the key does not exist under
    ///   this tenant, including keys that exist under *other* tenants
    /// * `StorageError::Backend` - on I/O failure (classified transient)
    async fn read(&self, tenant: &TenantContext, key: &BlobKey) -> StorageResult<Vec<u8>>;

    /// Deletes the blob stored under `key`, if present.
    ///
    /// Idempotent: deleting a non-existent key is not an error. Keys are
    /// write-once, so a deleted key is never reused for a new object.
    async fn delete(&self, tenant: &TenantContext, key: &BlobKey) -> StorageResult<()>;

    /// Checks whether a blob exists under `key` in the tenant's namespace.
    async fn exists(&self, tenant: &TenantContext, key: &BlobKey) -> StorageResult<bool> {
        use crate::error::{BlobError, StorageError};
        match self.read(tenant, key).await {
            Ok(_) => Ok(true),
            Err(StorageError::Blob(BlobError::NotFound { .. })) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
