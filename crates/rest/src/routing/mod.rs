//! Route configuration.
//!
//! Defines all routes for the Vellum HTTP API.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use vellum_storage::blob::BlobStore;

use crate::handlers;
use crate::middleware::tenant_middleware;
use crate::state::AppState;

/// Creates all API routes, with tenant enforcement applied to the stack.
///
/// # Routes
///
/// ## System-level (exempt from tenant resolution)
/// - `GET /health` - Health check
/// - `GET /_liveness` - Liveness probe
/// - `GET /_readiness` - Readiness probe
///
/// ## Documents
/// - `POST /documents` - Upload
/// - `GET /documents/{key}` - Download
/// - `DELETE /documents/{key}` - Delete
///
/// ## Jobs
/// - `GET /jobs/{id}` - Job status
pub fn create_routes<S>(state: AppState<S>) -> Router
where
    S: BlobStore + 'static,
{
    let config = state.config_arc();

    Router::new()
        // System-level routes
        .route("/health", get(handlers::health_handler::<S>))
        .route("/_liveness", get(handlers::liveness_handler))
        .route("/_readiness", get(handlers::readiness_handler::<S>))
        // Document routes
        .route("/documents", post(handlers::upload_handler::<S>))
        .route("/documents/{key}", get(handlers::download_handler::<S>))
        .route("/documents/{key}", delete(handlers::delete_handler::<S>))
        // Job routes
        .route("/jobs/{id}", get(handlers::job_status_handler::<S>))
        // Tenant enforcement wraps every route; exempt paths opt out inside
        // the middleware itself.
        .layer(middleware::from_fn_with_state(
            Arc::clone(&config),
            tenant_middleware,
        ))
        // State
        .with_state(state)
}
