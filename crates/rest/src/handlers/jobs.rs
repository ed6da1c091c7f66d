//! Job status handler.

use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use vellum_storage::blob::BlobStore;
use vellum_storage::jobs::JobId;

use crate::error::{ApiError, ApiResult};
use crate::extractors::TenantExtractor;
use crate::state::AppState;

/// Handler for job status lookup.
///
/// Jobs are tenant-scoped: a job id belonging to another tenant is
/// indistinguishable from a missing one.
///
/// # HTTP Request
///
/// `GET [base]/jobs/{id}`
pub async fn job_status_handler<S>(
    State(state): State<AppState<S>>,
    tenant: TenantExtractor,
    Path(id): Path<String>,
) -> ApiResult<Response>
where
    S: BlobStore,
{
    let record = state
        .queue()
        .get(&JobId::new(id))?
        .filter(|record| record.tenant_id.as_str() == tenant.tenant_id())
        .ok_or(ApiError::NotFound { kind: "Job" })?;

    let body = serde_json::json!({
        "id": record.id,
        "kind": record.kind,
        "status": record.status,
        "attempts": record.attempts,
        "error": record.error,
        "enqueuedAt": record.enqueued_at.to_rfc3339(),
    });
    Ok(Json(body).into_response())
}
