//! Task-local tenant scope.
//!
//! A per-operation ambient slot holding the active [`TenantContext`],
//! readable by any code reached during that operation's execution and
//! invisible to concurrently executing unrelated operations.
//!
//! The scope boundary is one inbound request or one background job
//! execution. The slot is backed by a tokio task-local, so it is discarded
//! when the bound future completes - including on error paths - and is
//! never shared across tasks.
//!
//! # Examples
//!
//! ```
//! use vellum_storage::tenant::{TenantContext, TenantId, scope};
//!
//! # tokio_test::block_on(async {
//! let ctx = TenantContext::new(TenantId::new("acme"));
//! scope::bind(ctx, async {
//!     let current = scope::current().unwrap();
//!     assert_eq!(current.tenant_id().as_str(), "acme");
//! })
//! .await
//! .unwrap();
//!
//! // Outside any scope, reads fail loudly.
//! assert!(scope::current().is_err());
//! # });
//! ```

use std::future::Future;

use crate::error::TenantError;

use super::context::TenantContext;

tokio::task_local! {
    static CURRENT_TENANT: TenantContext;
}

/// Binds `ctx` as the ambient tenant for the duration of `fut`.
///
/// Binding is idempotent for the same tenant: if the current task is
/// already scoped to `ctx`'s tenant, `fut` runs in the existing scope.
/// Rebinding to a *different* tenant inside a live scope is a programming
/// error and fails with [`TenantError::ScopeAlreadyBound`]; it is never
/// silently accepted.
pub async fn bind<F>(ctx: TenantContext, fut: F) -> Result<F::Output, TenantError>
where
    F: Future,
{
    match try_current() {
        Some(existing) => {
            if existing.tenant_id() == ctx.tenant_id() {
                Ok(fut.await)
            } else {
                Err(TenantError::ScopeAlreadyBound {
                    current: existing.tenant_id().clone(),
                    attempted: ctx.tenant_id().clone(),
                })
            }
        }
        None => Ok(CURRENT_TENANT.scope(ctx, fut).await),
    }
}

/// Returns the tenant context bound to the current scope.
///
/// Fails with [`TenantError::ScopeNotBound`] when called outside any bound
/// scope. Callers must branch on this explicitly - an unbound scope is a
/// defect, never an empty tenant.
pub fn current() -> Result<TenantContext, TenantError> {
    CURRENT_TENANT
        .try_with(|ctx| ctx.clone())
        .map_err(|_| TenantError::ScopeNotBound)
}

/// Returns the bound tenant context, or `None` outside any scope.
///
/// For diagnostics only; operational code should use [`current`] so the
/// missing-scope condition surfaces as an error.
pub fn try_current() -> Option<TenantContext> {
    CURRENT_TENANT.try_with(|ctx| ctx.clone()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenant::TenantId;

    fn ctx(id: &str) -> TenantContext {
        TenantContext::new(TenantId::new(id))
    }

    #[tokio::test]
    async fn test_bind_and_read() {
        let observed = bind(ctx("acme"), async { current().unwrap() })
            .await
            .unwrap();
        assert_eq!(observed.tenant_id().as_str(), "acme");
    }

    #[tokio::test]
    async fn test_unbound_read_fails() {
        let err = current().unwrap_err();
        assert!(matches!(err, TenantError::ScopeNotBound));
        assert!(try_current().is_none());
    }

    #[tokio::test]
    async fn test_scope_discarded_after_future() {
        bind(ctx("acme"), async {}).await.unwrap();
        assert!(current().is_err());
    }

    #[tokio::test]
    async fn test_rebind_same_tenant_is_idempotent() {
        let result = bind(ctx("acme"), async {
            bind(ctx("acme"), async { current().unwrap() }).await
        })
        .await
        .unwrap()
        .unwrap();
        assert_eq!(result.tenant_id().as_str(), "acme");
    }

    #[tokio::test]
    async fn test_rebind_different_tenant_fails() {
        let result = bind(ctx("acme"), async { bind(ctx("globex"), async {}).await })
            .await
            .unwrap();
        assert!(matches!(
            result,
            Err(TenantError::ScopeAlreadyBound { .. })
        ));
    }

    #[tokio::test]
    async fn test_concurrent_scopes_are_isolated() {
        let a = tokio::spawn(bind(ctx("acme"), async {
            tokio::task::yield_now().await;
            current().unwrap().tenant_id().as_str().to_string()
        }));
        let b = tokio::spawn(bind(ctx("globex"), async {
            tokio::task::yield_now().await;
            current().unwrap().tenant_id().as_str().to_string()
        }));

        assert_eq!(a.await.unwrap().unwrap(), "acme");
        assert_eq!(b.await.unwrap().unwrap(), "globex");
    }
}
