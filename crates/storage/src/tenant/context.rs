//! Tenant context for storage operations.
//!
//! This module defines [`TenantContext`], which provides validated tenant
//! information required for ALL storage operations. This design ensures
//! tenant isolation at the type level - operations cannot be performed
//! without a valid tenant context.

use super::id::TenantId;

/// A validated tenant context required for all storage operations.
///
/// `TenantContext` encapsulates the tenant identity for one unit of work,
/// providing a type-level guarantee that blob and job operations are
/// tenant-aware.
///
/// # Design Philosophy
///
/// The storage layer requires a `TenantContext` for every operation. There
/// is no "escape hatch" or way to bypass tenant isolation. This ensures:
///
/// 1. **Compile-time safety**: Forgetting to pass tenant context is a compile error
/// 2. **Audit trail**: Every operation has an associated tenant
/// 3. **Isolation**: Cross-tenant access is structurally impossible
///
/// # Examples
///
/// ```
/// use vellum_storage::tenant::{TenantContext, TenantId};
///
/// let ctx = TenantContext::new(TenantId::new("acme"))
///     .with_correlation_id("req-123");
/// assert_eq!(ctx.tenant_id().as_str(), "acme");
/// ```
#[derive(Debug, Clone)]
pub struct TenantContext {
    /// The tenant identifier.
    tenant_id: TenantId,
    /// Optional correlation ID for request/job tracing.
    correlation_id: Option<String>,
}

impl TenantContext {
    /// Creates a new tenant context for the given tenant.
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            correlation_id: None,
        }
    }

    /// Creates a context with the specified correlation ID for tracing.
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Returns the tenant ID.
    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    /// Returns the correlation ID, if set.
    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }
}
