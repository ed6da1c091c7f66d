//! Vellum Storage Layer
//!
//! This crate provides the tenant-isolated storage core for the Vellum
//! document platform: blob storage, a durable background job pipeline, and
//! the tenant context plumbing both are built on.
//!
//! # Architecture
//!
//! The storage layer is organized into several modules:
//!
//! - [`tenant`] - Tenant identity, per-operation context, and the ambient
//!   tenant scope
//! - [`blob`] - Content-addressed blob storage with per-tenant namespacing
//! - [`jobs`] - Durable SQLite-backed job queue and dispatcher
//! - [`error`] - Error types for all operations
//!
//! # Multitenancy
//!
//! All blob operations require a [`TenantContext`](tenant::TenantContext),
//! ensuring tenant isolation at the type level, and the on-disk layout
//! namespaces every blob under its owning tenant, so a key leaked across
//! tenants resolves to nothing. Background jobs snapshot the tenant at
//! enqueue time and rebind the scope at execution time.
//!
//! # Quick Start
//!
//! ```no_run
//! use vellum_storage::blob::{BlobStore, LocalBlobStore};
//! use vellum_storage::tenant::{TenantContext, TenantId};
//!
//! # async fn example() -> vellum_storage::StorageResult<()> {
//! let store = LocalBlobStore::new("/var/lib/vellum/blobs");
//! let tenant = TenantContext::new(TenantId::parse("acme")?);
//!
//! let key = store.save(&tenant, b"quarterly report", "report.pdf").await?;
//! let content = store.read(&tenant, &key).await?;
//! assert_eq!(content, b"quarterly report");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod blob;
pub mod error;
pub mod jobs;
pub mod tenant;

// Re-export commonly used types at crate root
pub use blob::{BlobKey, BlobStore, LocalBlobStore};
pub use error::{StorageError, StorageResult};
pub use jobs::{JobDispatcher, JobHandler, JobId, JobStatus, RetryPolicy, SqliteJobQueue};
pub use tenant::{TenantContext, TenantId};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
