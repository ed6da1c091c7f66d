//! Multi-tenant support.
//!
//! This module provides the tenant identity types and the per-operation
//! tenant scope:
//!
//! - [`TenantId`] - opaque, validated tenant identifier
//! - [`TenantContext`] - per-operation context required by every storage API
//! - [`scope`] - task-local ambient slot for one request or job execution
//!
//! # Tenant Isolation
//!
//! All blob and job operations take a [`TenantContext`] as their first
//! parameter, so tenant isolation is enforced at the type level. The
//! ambient [`scope`] exists for plumbing the same context through layers
//! that don't thread it explicitly (HTTP middleware to handlers, the job
//! dispatcher to job bodies); it never replaces the explicit parameter.

mod context;
mod id;
pub mod scope;

pub use context::TenantContext;
pub use id::{MAX_TENANT_ID_LEN, TenantId, is_valid_tenant_id};
