//! Tenant enforcement middleware.
//!
//! Resolves the tenant for every non-exempt request, rejects requests with
//! no resolvable tenant, and runs the remainder of the middleware stack and
//! the handler inside the ambient tenant scope.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;
use vellum_storage::tenant::{TenantContext, scope};

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::tenant::{ResolvedTenant, TenantResolver};

/// Header consulted for a correlation id, when request-id tracking is on.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Middleware function for tenant enforcement.
///
/// Used with `axum::middleware::from_fn_with_state`. Exempt paths and CORS
/// pre-flight requests bypass resolution; every other request either runs
/// inside a bound tenant scope or is rejected with 400 before any handler
/// executes.
pub async fn tenant_middleware(
    State(config): State<Arc<ServerConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    if config.multitenancy.is_exempt(path) || request.method() == Method::OPTIONS {
        return next.run(request).await;
    }

    let (mut parts, body) = request.into_parts();

    let resolver = TenantResolver::new();
    let Some(resolved) = resolver.resolve(&parts, &config.multitenancy) else {
        debug!(path = %parts.uri.path(), "Rejecting request with no resolvable tenant");
        return ApiError::MissingTenant.into_response();
    };

    debug!(
        tenant_id = %resolved.tenant_id,
        source = %resolved.source,
        "Resolved tenant"
    );

    let mut ctx = TenantContext::new(resolved.tenant_id.clone());
    if let Some(request_id) = parts
        .headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
    {
        ctx = ctx.with_correlation_id(request_id);
    }

    parts.extensions.insert::<ResolvedTenant>(resolved);
    let request = Request::from_parts(parts, body);

    match scope::bind(ctx, next.run(request)).await {
        Ok(response) => response,
        Err(e) => ApiError::from(e).into_response(),
    }
}
