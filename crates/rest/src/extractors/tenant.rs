//! Tenant context extractor.
//!
//! Extracts the tenant resolved by the middleware and hands handlers a
//! [`TenantContext`].

use axum::{extract::FromRequestParts, http::request::Parts};
use vellum_storage::tenant::{TenantContext, TenantId};

use crate::error::ApiError;
use crate::tenant::ResolvedTenant;

/// Axum extractor for tenant context.
///
/// Reads the [`ResolvedTenant`] placed in request extensions by the tenant
/// middleware. The rejection is the same 400 body the middleware produces;
/// a handler can never observe a request without a tenant.
///
/// # Example
///
/// ```rust,ignore
/// use vellum_rest::extractors::TenantExtractor;
///
/// async fn handler(tenant: TenantExtractor) {
///     println!("Tenant ID: {}", tenant.tenant_id());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct TenantExtractor {
    context: TenantContext,
}

impl TenantExtractor {
    /// Creates a new TenantExtractor for the given tenant ID (for tests).
    pub fn new(tenant_id: &str) -> Self {
        Self {
            context: TenantContext::new(TenantId::new(tenant_id)),
        }
    }

    /// Returns a reference to the tenant context.
    pub fn context(&self) -> &TenantContext {
        &self.context
    }

    /// Returns the tenant ID as a string.
    pub fn tenant_id(&self) -> &str {
        self.context.tenant_id().as_str()
    }

    /// Consumes the extractor and returns the tenant context.
    pub fn into_context(self) -> TenantContext {
        self.context
    }
}

impl std::fmt::Display for TenantExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tenant_id())
    }
}

impl<S> FromRequestParts<S> for TenantExtractor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let resolved = parts
            .extensions
            .get::<ResolvedTenant>()
            .ok_or(ApiError::MissingTenant)?;

        Ok(Self {
            context: TenantContext::new(resolved.tenant_id.clone()),
        })
    }
}
