//! Application state for the Vellum HTTP API.
//!
//! This module defines the shared application state that is available to all
//! request handlers. It includes the blob store, job dispatcher and queue,
//! and the server configuration.

use std::sync::Arc;

use vellum_storage::blob::BlobStore;
use vellum_storage::jobs::{JobDispatcher, SqliteJobQueue};

use crate::config::ServerConfig;

/// Shared application state for the REST API.
///
/// # Type Parameters
///
/// * `S` - The blob store type (must implement [`BlobStore`])
pub struct AppState<S> {
    /// The blob storage backend.
    store: Arc<S>,

    /// The background job dispatcher.
    dispatcher: Arc<JobDispatcher>,

    /// The job queue, for status lookups and readiness checks.
    queue: Arc<SqliteJobQueue>,

    /// Server configuration.
    config: Arc<ServerConfig>,
}

// Manually implement Clone since S is wrapped in Arc and doesn't need to be Clone
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            dispatcher: Arc::clone(&self.dispatcher),
            queue: Arc::clone(&self.queue),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S: BlobStore> AppState<S> {
    /// Creates a new AppState.
    pub fn new(
        store: Arc<S>,
        dispatcher: Arc<JobDispatcher>,
        queue: Arc<SqliteJobQueue>,
        config: ServerConfig,
    ) -> Self {
        Self {
            store,
            dispatcher,
            queue,
            config: Arc::new(config),
        }
    }

    /// Returns a reference to the blob store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns a reference to the job dispatcher.
    pub fn dispatcher(&self) -> &JobDispatcher {
        &self.dispatcher
    }

    /// Returns a reference to the job queue.
    pub fn queue(&self) -> &SqliteJobQueue {
        &self.queue
    }

    /// Returns a reference to the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns a clone of the configuration Arc, for middleware state.
    pub fn config_arc(&self) -> Arc<ServerConfig> {
        Arc::clone(&self.config)
    }
}
