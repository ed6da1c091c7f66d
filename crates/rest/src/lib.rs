//! # vellum-rest - Vellum Document Platform HTTP API
//!
//! This crate provides the HTTP surface of the Vellum document platform:
//! tenant resolution and enforcement, document upload/download/delete
//! handlers, and job status lookups, layered over the `vellum-storage`
//! blob store and job pipeline.
//!
//! ## Multi-Tenancy
//!
//! Every request on a non-exempt path must carry a tenant identifier,
//! resolved in priority order from:
//!
//! 1. The tenant header (`x-tenant-id` by default)
//! 2. The `tenant_id` identity claim
//! 3. The `tid` identity claim
//! 4. The external IdP tenant claim URI
//!
//! Resolution fails closed: a request with no resolvable tenant receives
//! `400 {"error": "Missing tenant identifier"}` before any handler or
//! storage code runs. Successful requests execute inside the ambient tenant
//! scope, so storage and job code observes exactly one tenant per request.
//!
//! ## API Endpoints
//!
//! | Operation | HTTP Method | URL Pattern |
//! |-----------|-------------|-------------|
//! | upload | POST | `/documents` |
//! | download | GET | `/documents/{key}` |
//! | delete | DELETE | `/documents/{key}` |
//! | job status | GET | `/jobs/{id}` |
//! | health | GET | `/health` |
//! | liveness | GET | `/_liveness` |
//! | readiness | GET | `/_readiness` |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vellum_rest::{ServerConfig, create_app_with_config};
//! use vellum_rest::processing::ProcessDocumentHandler;
//! use vellum_storage::blob::LocalBlobStore;
//! use vellum_storage::jobs::{JobDispatcher, SqliteJobQueue};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::default();
//!
//!     let store = Arc::new(LocalBlobStore::new(&config.blob_root));
//!     let queue = Arc::new(SqliteJobQueue::open(&config.queue_path)?);
//!     queue.init_schema()?;
//!
//!     let mut dispatcher = JobDispatcher::new(Arc::clone(&queue));
//!     dispatcher.register(Arc::new(ProcessDocumentHandler::new(Arc::clone(&store))));
//!     let dispatcher = Arc::new(dispatcher);
//!
//!     let app = create_app_with_config(store, dispatcher, queue, config);
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! All errors are returned as `{"error": "..."}` JSON bodies with
//! appropriate HTTP status codes:
//!
//! | HTTP Status | Description |
//! |-------------|-------------|
//! | 400 | Missing tenant / validation error |
//! | 404 | Document or job not found |
//! | 413 | Payload too large |
//! | 503 | Storage backend unavailable |
//! | 500 | Internal server error |
//!
//! ## Architecture
//!
//! - [`error`] - Error types and JSON error responses
//! - [`config`] - Server configuration
//! - [`state`] - Application state (blob store, dispatcher, queue, config)
//! - [`tenant`] - Multi-source tenant resolution
//! - [`middleware`] - Tenant enforcement middleware
//! - [`extractors`] - Axum extractors
//! - [`handlers`] - HTTP request handlers
//! - [`processing`] - Post-upload document processing job
//! - [`routing`] - Route configuration

// Enforce documentation
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod processing;
pub mod routing;
pub mod state;
pub mod tenant;

// Re-export commonly used types
pub use config::{MultitenancyConfig, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use state::AppState;

use std::sync::Arc;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use vellum_storage::blob::BlobStore;
use vellum_storage::jobs::{JobDispatcher, SqliteJobQueue};

/// Creates the Axum application with default configuration.
///
/// This is a convenience function that creates the app with default
/// settings. For more control, use [`create_app_with_config`].
pub fn create_app<S>(
    store: Arc<S>,
    dispatcher: Arc<JobDispatcher>,
    queue: Arc<SqliteJobQueue>,
) -> Router
where
    S: BlobStore + 'static,
{
    create_app_with_config(store, dispatcher, queue, ServerConfig::default())
}

/// Creates the Axum application with custom configuration.
///
/// This function sets up the complete API with all handlers, tenant
/// enforcement, and the middleware stack.
pub fn create_app_with_config<S>(
    store: Arc<S>,
    dispatcher: Arc<JobDispatcher>,
    queue: Arc<SqliteJobQueue>,
    config: ServerConfig,
) -> Router
where
    S: BlobStore + 'static,
{
    info!(
        "Creating REST API server with backend: {}",
        store.backend_name()
    );

    // Create application state
    let state = AppState::new(store, dispatcher, queue, config.clone());

    // Build the router with all routes and tenant enforcement
    let router = routing::create_routes(state);

    // Body limit applies before handlers buffer the upload
    let router = router.layer(axum::extract::DefaultBodyLimit::max(config.max_body_size));

    // Build middleware stack
    let service_builder = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            axum::http::StatusCode::REQUEST_TIMEOUT,
            std::time::Duration::from_secs(config.request_timeout),
        ));

    // Add CORS if enabled
    let router = if config.enable_cors {
        let cors = build_cors_layer(&config);
        router.layer(cors)
    } else {
        router
    };

    // Apply remaining middleware
    let router = router.layer(service_builder);

    // Request ID tracking (set before the tenant middleware reads it)
    if config.enable_request_id {
        router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    } else {
        router
    }
}

/// Builds the CORS layer based on configuration.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let mut cors = CorsLayer::new();

    // Configure origins
    if config.cors_origins == "*" {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_origin(origins);
    }

    // Configure methods
    if config.cors_methods == "*" {
        cors = cors.allow_methods(Any);
    } else {
        let methods: Vec<_> = config
            .cors_methods
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_methods(methods);
    }

    // Configure headers
    if config.cors_headers == "*" {
        cors = cors.allow_headers(Any);
    } else {
        let headers: Vec<_> = config
            .cors_headers
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_headers(headers);
    }

    cors
}

/// Initializes the tracing subscriber for logging.
///
/// This should be called once at application startup.
///
/// # Arguments
///
/// * `level` - The log level (error, warn, info, debug, trace)
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "vellum_rest={level},vellum_storage={level},tower_http=debug"
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
