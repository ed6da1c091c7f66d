//! Integration tests for tenant enforcement on the HTTP surface.
//!
//! Covers fail-closed resolution, exempt paths, claim fallback, per-tenant
//! document isolation, and the upload-to-processed job flow.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum_test::TestServer;
use tempfile::TempDir;
use vellum_rest::ServerConfig;
use vellum_rest::processing::ProcessDocumentHandler;
use vellum_rest::tenant::IdentityClaims;
use vellum_storage::blob::LocalBlobStore;
use vellum_storage::jobs::{JobDispatcher, SqliteJobQueue};

const X_TENANT_ID: HeaderName = HeaderName::from_static("x-tenant-id");
const X_FILE_NAME: HeaderName = HeaderName::from_static("x-file-name");

struct TestHarness {
    server: TestServer,
    dispatcher: Arc<JobDispatcher>,
    _blob_dir: TempDir,
}

/// Creates a test server over a temp blob root and an in-memory queue.
///
/// Workers are not started; tests drive job execution explicitly through
/// the dispatcher handle.
fn create_test_server(claims: Option<IdentityClaims>) -> TestHarness {
    let blob_dir = tempfile::tempdir().expect("Failed to create blob dir");
    let store = Arc::new(LocalBlobStore::new(blob_dir.path()));

    let queue = Arc::new(SqliteJobQueue::in_memory().expect("Failed to create queue"));
    queue.init_schema().expect("Failed to init schema");

    let config = ServerConfig::for_testing();
    let mut dispatcher =
        JobDispatcher::new(Arc::clone(&queue)).with_retry_policy(config.retry_policy());
    dispatcher.register(Arc::new(ProcessDocumentHandler::new(Arc::clone(&store))));
    let dispatcher = Arc::new(dispatcher);

    let app = vellum_rest::create_app_with_config(
        store,
        Arc::clone(&dispatcher),
        queue,
        config,
    );

    // Simulates the authentication layer: verified claims arrive as a
    // request extension before tenant resolution runs.
    let app = match claims {
        Some(claims) => app.layer(middleware::from_fn(
            move |mut request: Request, next: Next| {
                let claims = claims.clone();
                async move {
                    request.extensions_mut().insert(claims);
                    next.run(request).await
                }
            },
        )),
        None => app,
    };

    TestHarness {
        server: TestServer::new(app).expect("Failed to create test server"),
        dispatcher,
        _blob_dir: blob_dir,
    }
}

fn tenant(value: &'static str) -> (HeaderName, HeaderValue) {
    (X_TENANT_ID, HeaderValue::from_static(value))
}

#[tokio::test]
async fn test_missing_tenant_is_rejected_with_400() {
    let harness = create_test_server(None);

    let response = harness
        .server
        .post("/documents")
        .bytes(Bytes::from_static(b"contract text"))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Missing tenant identifier");

    // Reads and deletes are rejected the same way, before any lookup.
    let response = harness.server.get("/documents/some-key").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = harness.server.delete("/documents/some-key").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_exempt_paths_skip_tenant_resolution() {
    let harness = create_test_server(None);

    harness.server.get("/health").await.assert_status_ok();
    harness.server.get("/_liveness").await.assert_status_ok();
    harness.server.get("/_readiness").await.assert_status_ok();
}

#[tokio::test]
async fn test_preflight_is_not_rejected_for_missing_tenant() {
    let harness = create_test_server(None);

    let response = harness.server.method(axum::http::Method::OPTIONS, "/documents").await;
    assert_ne!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_download_roundtrip() {
    let harness = create_test_server(None);
    let (name, value) = tenant("acme");

    let response = harness
        .server
        .post("/documents")
        .add_header(name.clone(), value.clone())
        .add_header(X_FILE_NAME, HeaderValue::from_static("report.pdf"))
        .bytes(Bytes::from_static(b"quarterly numbers"))
        .await;
    response.assert_status(StatusCode::CREATED);

    let body: serde_json::Value = response.json();
    let key = body["key"].as_str().expect("key in response");
    assert!(key.contains("report.pdf"));
    assert!(body["jobId"].is_string());

    let response = harness
        .server
        .get(&format!("/documents/{}", key))
        .add_header(name, value)
        .await;
    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), b"quarterly numbers");
}

#[tokio::test]
async fn test_cross_tenant_key_replay_is_not_found() {
    let harness = create_test_server(None);

    let response = harness
        .server
        .post("/documents")
        .add_header(X_TENANT_ID, HeaderValue::from_static("acme"))
        .bytes(Bytes::from_static(b"acme secrets"))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    let key = body["key"].as_str().unwrap().to_string();

    // The exact key under another tenant resolves to nothing.
    let response = harness
        .server
        .get(&format!("/documents/{}", key))
        .add_header(X_TENANT_ID, HeaderValue::from_static("globex"))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    // Deleting under the wrong tenant is a no-op for the owner.
    harness
        .server
        .delete(&format!("/documents/{}", key))
        .add_header(X_TENANT_ID, HeaderValue::from_static("globex"))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    harness
        .server
        .get(&format!("/documents/{}", key))
        .add_header(X_TENANT_ID, HeaderValue::from_static("acme"))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let harness = create_test_server(None);
    let (name, value) = tenant("acme");

    let response = harness
        .server
        .post("/documents")
        .add_header(name.clone(), value.clone())
        .bytes(Bytes::from_static(b"ephemeral"))
        .await;
    let body: serde_json::Value = response.json();
    let key = body["key"].as_str().unwrap().to_string();

    for _ in 0..2 {
        harness
            .server
            .delete(&format!("/documents/{}", key))
            .add_header(name.clone(), value.clone())
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }

    harness
        .server
        .get(&format!("/documents/{}", key))
        .add_header(name, value)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_key_is_bad_request() {
    let harness = create_test_server(None);
    let (name, value) = tenant("acme");

    let response = harness
        .server
        .get("/documents/has%20space")
        .add_header(name, value)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_claim_fallback_resolves_tenant() {
    let claims = IdentityClaims::new().with("tenant_id", "globex");
    let harness = create_test_server(Some(claims));

    // No header: the tenant_id claim carries the request.
    let response = harness
        .server
        .post("/documents")
        .bytes(Bytes::from_static(b"claimed upload"))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    let key = body["key"].as_str().unwrap().to_string();

    let response = harness
        .server
        .get(&format!("/documents/{}", key))
        .await;
    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), b"claimed upload");

    // A header still outranks the claim.
    let response = harness
        .server
        .get(&format!("/documents/{}", key))
        .add_header(X_TENANT_ID, HeaderValue::from_static("acme"))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_enqueues_job_that_runs_as_uploader() {
    let harness = create_test_server(None);
    let (name, value) = tenant("acme");

    let response = harness
        .server
        .post("/documents")
        .add_header(name.clone(), value.clone())
        .bytes(Bytes::from_static(b"to be processed"))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    let job_id = body["jobId"].as_str().unwrap().to_string();

    // Drive the worker step the server would normally poll.
    assert_eq!(harness.dispatcher.run_pending().await.unwrap(), 1);

    let response = harness
        .server
        .get(&format!("/jobs/{}", job_id))
        .add_header(name, value)
        .await;
    response.assert_status_ok();
    let status: serde_json::Value = response.json();
    assert_eq!(status["status"], "succeeded");
    assert_eq!(status["attempts"], 1);

    // The job is invisible to other tenants.
    let response = harness
        .server
        .get(&format!("/jobs/{}", job_id))
        .add_header(X_TENANT_ID, HeaderValue::from_static("globex"))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_upload_is_rejected() {
    let harness = create_test_server(None);
    let (name, value) = tenant("acme");

    let response = harness
        .server
        .post("/documents")
        .add_header(name, value)
        .bytes(Bytes::new())
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}
