//! Document upload, download, and delete handlers.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{debug, info};
use vellum_storage::blob::{BlobKey, BlobStore};

use crate::error::{ApiError, ApiResult};
use crate::extractors::TenantExtractor;
use crate::processing::PROCESS_DOCUMENT_KIND;
use crate::state::AppState;

/// Header carrying the client's original file name on upload.
pub const X_FILE_NAME: &str = "x-file-name";

/// Handler for document upload.
///
/// Saves the request body as a blob under the caller's tenant and enqueues
/// a processing job carrying the new blob key. The job runs as the
/// uploading tenant regardless of when a worker picks it up.
///
/// # HTTP Request
///
/// `POST [base]/documents` with the raw document as the body and an
/// optional `X-File-Name` header.
///
/// # Response
///
/// - `201 Created` with `{"key": ..., "jobId": ...}` and a `Location` header
/// - `400 Bad Request` for an empty body
pub async fn upload_handler<S>(
    State(state): State<AppState<S>>,
    tenant: TenantExtractor,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response>
where
    S: BlobStore,
{
    if body.is_empty() {
        return Err(ApiError::BadRequest {
            message: "Request body is empty".to_string(),
        });
    }

    let name = headers
        .get(X_FILE_NAME)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .unwrap_or("document");

    let key = state.store().save(tenant.context(), &body, name).await?;
    let job_id = state
        .dispatcher()
        .enqueue(tenant.context(), PROCESS_DOCUMENT_KIND, key.as_str())?;

    info!(
        tenant_id = %tenant,
        key = %key,
        job_id = %job_id,
        size = body.len(),
        "Document uploaded"
    );

    let body = serde_json::json!({
        "key": key,
        "jobId": job_id,
    });
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/documents/{}", key))],
        Json(body),
    )
        .into_response())
}

/// Handler for document download.
///
/// # HTTP Request
///
/// `GET [base]/documents/{key}`
///
/// # Response
///
/// - `200 OK` with the raw document bytes
/// - `404 Not Found` when the key does not exist under the caller's tenant
pub async fn download_handler<S>(
    State(state): State<AppState<S>>,
    tenant: TenantExtractor,
    Path(key): Path<String>,
) -> ApiResult<Response>
where
    S: BlobStore,
{
    let key = BlobKey::parse(&key)?;
    let content = state.store().read(tenant.context(), &key).await?;

    debug!(tenant_id = %tenant, key = %key, size = content.len(), "Document downloaded");

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/octet-stream")],
        content,
    )
        .into_response())
}

/// Handler for document deletion.
///
/// Deletion is idempotent: removing a key that does not exist (or was
/// already removed) succeeds.
///
/// # HTTP Request
///
/// `DELETE [base]/documents/{key}`
///
/// # Response
///
/// - `204 No Content`
pub async fn delete_handler<S>(
    State(state): State<AppState<S>>,
    tenant: TenantExtractor,
    Path(key): Path<String>,
) -> ApiResult<Response>
where
    S: BlobStore,
{
    let key = BlobKey::parse(&key)?;
    state.store().delete(tenant.context(), &key).await?;

    info!(tenant_id = %tenant, key = %key, "Document deleted");

    Ok(StatusCode::NO_CONTENT.into_response())
}
