//! Health check endpoint handlers.
//!
//! Provides health, liveness, and readiness endpoints for monitoring and
//! load balancers. All three are exempt from tenant resolution.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::debug;
use vellum_storage::blob::BlobStore;

use crate::error::ApiResult;
use crate::state::AppState;

/// Handler for the health check endpoint.
///
/// # HTTP Request
///
/// `GET [base]/health`
pub async fn health_handler<S>(State(state): State<AppState<S>>) -> ApiResult<Response>
where
    S: BlobStore,
{
    debug!("Processing health check request");

    let health_response = serde_json::json!({
        "status": "healthy",
        "backend": state.store().backend_name(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    });

    Ok((StatusCode::OK, Json(health_response)).into_response())
}

/// Handler for the liveness probe.
///
/// # HTTP Request
///
/// `GET [base]/_liveness`
pub async fn liveness_handler() -> impl IntoResponse {
    StatusCode::OK
}

/// Handler for the readiness probe.
///
/// Verifies the job queue is reachable before reporting ready.
///
/// # HTTP Request
///
/// `GET [base]/_readiness`
pub async fn readiness_handler<S>(State(state): State<AppState<S>>) -> ApiResult<Response>
where
    S: BlobStore,
{
    debug!("Processing readiness check request");

    let pending = state.queue().count(None)?;

    let response = serde_json::json!({
        "status": "ready",
        "backend": state.store().backend_name(),
        "checks": {
            "blob_store": "ok",
            "job_queue": "ok"
        },
        "jobs": pending
    });

    Ok((StatusCode::OK, Json(response)).into_response())
}
