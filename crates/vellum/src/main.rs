//! Vellum Document Platform Server
//!
//! Tenant-isolated document storage with durable background processing.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use vellum_rest::processing::ProcessDocumentHandler;
use vellum_rest::{ServerConfig, create_app_with_config, init_logging};
use vellum_storage::blob::LocalBlobStore;
use vellum_storage::jobs::{JobDispatcher, SqliteJobQueue};

/// Opens the job queue and requeues work interrupted by a previous crash.
fn create_queue(config: &ServerConfig) -> anyhow::Result<Arc<SqliteJobQueue>> {
    info!(path = %config.queue_path, "Initializing job queue");

    let queue = if config.queue_path == ":memory:" {
        SqliteJobQueue::in_memory()?
    } else {
        if let Some(parent) = std::path::Path::new(&config.queue_path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        SqliteJobQueue::open(&config.queue_path)?
    };
    queue.init_schema()?;

    let recovered = queue.recover_interrupted()?;
    if recovered > 0 {
        info!(recovered, "Requeued jobs interrupted by previous shutdown");
    }

    Ok(Arc::new(queue))
}

/// Starts the Axum HTTP server.
async fn serve(app: axum::Router, config: &ServerConfig) -> anyhow::Result<()> {
    let addr = config.socket_addr();
    info!(address = %addr, "Server listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until the process is killed.
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    info!(
        port = config.port,
        host = %config.host,
        blob_root = %config.blob_root,
        workers = config.workers,
        "Starting Vellum server"
    );

    let store = Arc::new(LocalBlobStore::new(&config.blob_root));
    let queue = create_queue(&config)?;

    let mut dispatcher = JobDispatcher::new(Arc::clone(&queue))
        .with_retry_policy(config.retry_policy())
        .with_retention(Duration::from_secs(config.job_retention_hours * 3600));
    dispatcher.register(Arc::new(ProcessDocumentHandler::new(Arc::clone(&store))));
    let dispatcher = Arc::new(dispatcher);

    let workers = Arc::clone(&dispatcher).start(config.workers);

    let app = create_app_with_config(
        Arc::clone(&store),
        Arc::clone(&dispatcher),
        Arc::clone(&queue),
        config.clone(),
    );

    serve(app, &config).await?;

    info!("Shutting down workers");
    workers.shutdown().await;

    Ok(())
}
