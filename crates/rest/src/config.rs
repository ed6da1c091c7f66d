//! Server configuration for the Vellum HTTP API.
//!
//! This module provides configuration types for the REST server, supporting
//! both programmatic configuration and environment variable overrides.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `VELLUM_SERVER_PORT` | 8080 | Server port |
//! | `VELLUM_SERVER_HOST` | 127.0.0.1 | Host to bind |
//! | `VELLUM_LOG_LEVEL` | info | Log level |
//! | `VELLUM_MAX_BODY_SIZE` | 10485760 | Max request body (bytes) |
//! | `VELLUM_REQUEST_TIMEOUT` | 30 | Request timeout (seconds) |
//! | `VELLUM_ENABLE_CORS` | true | Enable CORS |
//! | `VELLUM_CORS_ORIGINS` | * | Allowed origins |
//! | `VELLUM_BLOB_ROOT` | ./data/blobs | Blob storage root directory |
//! | `VELLUM_QUEUE_PATH` | ./data/jobs.db | Job queue database path |
//! | `VELLUM_WORKERS` | 2 | Job worker count |
//! | `VELLUM_TENANT_HEADER` | x-tenant-id | Tenant identification header |
//! | `VELLUM_TENANT_EXEMPT_PATHS` | /health,/_liveness,/_readiness,/metrics,/_diagnostics | Paths that skip tenant resolution |
//!
//! # Example
//!
//! ```rust
//! use vellum_rest::ServerConfig;
//!
//! // Create from environment
//! let config = ServerConfig::from_env();
//!
//! // Or create programmatically
//! let config = ServerConfig {
//!     port: 3000,
//!     host: "0.0.0.0".to_string(),
//!     enable_cors: true,
//!     ..Default::default()
//! };
//! ```

use clap::{Args, Parser};

/// Server configuration for the Vellum HTTP API.
///
/// This struct can be constructed from environment variables using
/// [`ServerConfig::from_env`], from command line arguments using
/// [`ServerConfig::parse`], or programmatically.
#[derive(Debug, Clone, Parser)]
#[command(name = "vellum")]
#[command(about = "Vellum Document Platform Server")]
pub struct ServerConfig {
    /// Port to listen on.
    #[arg(short, long, env = "VELLUM_SERVER_PORT", default_value = "8080")]
    pub port: u16,

    /// Host address to bind to.
    #[arg(long, env = "VELLUM_SERVER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "VELLUM_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Maximum request body size in bytes.
    #[arg(long, env = "VELLUM_MAX_BODY_SIZE", default_value = "10485760")]
    pub max_body_size: usize,

    /// Request timeout in seconds.
    #[arg(long, env = "VELLUM_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    /// Enable CORS.
    #[arg(long, env = "VELLUM_ENABLE_CORS", default_value = "true")]
    pub enable_cors: bool,

    /// Allowed CORS origins (comma-separated, or * for all).
    #[arg(long, env = "VELLUM_CORS_ORIGINS", default_value = "*")]
    pub cors_origins: String,

    /// Allowed CORS methods (comma-separated, or * for all).
    #[arg(
        long,
        env = "VELLUM_CORS_METHODS",
        default_value = "GET,POST,DELETE,OPTIONS"
    )]
    pub cors_methods: String,

    /// Allowed CORS headers (comma-separated, or * for all).
    #[arg(
        long,
        env = "VELLUM_CORS_HEADERS",
        default_value = "Content-Type,Authorization,Accept,X-Tenant-ID,X-File-Name"
    )]
    pub cors_headers: String,

    /// Enable request ID tracking.
    #[arg(long, env = "VELLUM_ENABLE_REQUEST_ID", default_value = "true")]
    pub enable_request_id: bool,

    /// Root directory for blob storage.
    #[arg(long, env = "VELLUM_BLOB_ROOT", default_value = "./data/blobs")]
    pub blob_root: String,

    /// Path to the job queue database (or :memory:).
    #[arg(long, env = "VELLUM_QUEUE_PATH", default_value = "./data/jobs.db")]
    pub queue_path: String,

    /// Number of background job workers.
    #[arg(long, env = "VELLUM_WORKERS", default_value = "2")]
    pub workers: usize,

    /// Maximum job execution attempts (first run included).
    #[arg(long, env = "VELLUM_JOB_MAX_ATTEMPTS", default_value = "3")]
    pub job_max_attempts: u32,

    /// Base retry delay in milliseconds.
    #[arg(long, env = "VELLUM_JOB_BASE_DELAY_MS", default_value = "250")]
    pub job_base_delay_ms: u64,

    /// Maximum retry delay in milliseconds.
    #[arg(long, env = "VELLUM_JOB_MAX_DELAY_MS", default_value = "30000")]
    pub job_max_delay_ms: u64,

    /// Hours to keep terminal job records before they are swept.
    #[arg(long, env = "VELLUM_JOB_RETENTION_HOURS", default_value = "72")]
    pub job_retention_hours: u64,

    /// Multitenancy settings.
    #[command(flatten)]
    pub multitenancy: MultitenancyConfig,
}

/// Tenant resolution settings.
#[derive(Debug, Clone, Args)]
pub struct MultitenancyConfig {
    /// Header carrying the tenant identifier.
    #[arg(long, env = "VELLUM_TENANT_HEADER", default_value = "x-tenant-id")]
    pub tenant_header: String,

    /// Primary identity claim carrying the tenant identifier.
    #[arg(long, env = "VELLUM_TENANT_CLAIM", default_value = "tenant_id")]
    pub tenant_claim: String,

    /// Short-form identity claim (checked after the primary claim).
    #[arg(long, env = "VELLUM_TENANT_SHORT_CLAIM", default_value = "tid")]
    pub short_tenant_claim: String,

    /// External IdP claim URI (checked last).
    #[arg(
        long,
        env = "VELLUM_TENANT_EXTERNAL_CLAIM",
        default_value = "http://schemas.microsoft.com/identity/claims/tenantid"
    )]
    pub external_tenant_claim: String,

    /// Path prefixes that skip tenant resolution (comma-separated).
    #[arg(
        long,
        env = "VELLUM_TENANT_EXEMPT_PATHS",
        default_value = "/health,/_liveness,/_readiness,/metrics,/_diagnostics"
    )]
    pub exempt_paths: String,
}

impl Default for MultitenancyConfig {
    fn default() -> Self {
        Self {
            tenant_header: "x-tenant-id".to_string(),
            tenant_claim: "tenant_id".to_string(),
            short_tenant_claim: "tid".to_string(),
            external_tenant_claim: "http://schemas.microsoft.com/identity/claims/tenantid"
                .to_string(),
            exempt_paths: "/health,/_liveness,/_readiness,/metrics,/_diagnostics".to_string(),
        }
    }
}

impl MultitenancyConfig {
    /// Returns true if the given request path skips tenant resolution.
    pub fn is_exempt(&self, path: &str) -> bool {
        self.exempt_paths
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .any(|prefix| path == prefix || path.starts_with(&format!("{}/", prefix)))
    }

    /// Returns the identity claim names in resolution priority order.
    pub fn claim_names(&self) -> [&str; 3] {
        [
            &self.tenant_claim,
            &self.short_tenant_claim,
            &self.external_tenant_claim,
        ]
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            log_level: "info".to_string(),
            max_body_size: 10 * 1024 * 1024, // 10MB
            request_timeout: 30,
            enable_cors: true,
            cors_origins: "*".to_string(),
            cors_methods: "GET,POST,DELETE,OPTIONS".to_string(),
            cors_headers: "Content-Type,Authorization,Accept,X-Tenant-ID,X-File-Name".to_string(),
            enable_request_id: true,
            blob_root: "./data/blobs".to_string(),
            queue_path: "./data/jobs.db".to_string(),
            workers: 2,
            job_max_attempts: 3,
            job_base_delay_ms: 250,
            job_max_delay_ms: 30_000,
            job_retention_hours: 72,
            multitenancy: MultitenancyConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Creates a new ServerConfig from environment variables.
    ///
    /// This is a convenience method that parses environment variables without
    /// requiring command line arguments.
    pub fn from_env() -> Self {
        Self::try_parse().unwrap_or_default()
    }

    /// Returns the socket address to bind to.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the configured retry policy for the job dispatcher.
    pub fn retry_policy(&self) -> vellum_storage::RetryPolicy {
        vellum_storage::RetryPolicy {
            max_attempts: self.job_max_attempts,
            base_delay: std::time::Duration::from_millis(self.job_base_delay_ms),
            max_delay: std::time::Duration::from_millis(self.job_max_delay_ms),
        }
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.port == 0 {
            errors.push("Port cannot be 0".to_string());
        }

        if self.max_body_size == 0 {
            errors.push("Max body size cannot be 0".to_string());
        }

        if self.request_timeout == 0 {
            errors.push("Request timeout cannot be 0".to_string());
        }

        if self.workers == 0 {
            errors.push("Worker count cannot be 0".to_string());
        }

        if self.job_max_attempts == 0 {
            errors.push("Job max attempts cannot be 0".to_string());
        }

        if self.job_base_delay_ms > self.job_max_delay_ms {
            errors.push("Job base delay cannot exceed max delay".to_string());
        }

        if self.multitenancy.tenant_header.is_empty() {
            errors.push("Tenant header name cannot be empty".to_string());
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Creates a configuration suitable for testing.
    ///
    /// This uses ephemeral port 0 and disables features that might interfere
    /// with tests.
    pub fn for_testing() -> Self {
        Self {
            port: 0, // Let OS assign port
            host: "127.0.0.1".to_string(),
            log_level: "debug".to_string(),
            max_body_size: 10 * 1024 * 1024,
            request_timeout: 5, // Shorter timeout for tests
            enable_cors: false,
            cors_origins: "*".to_string(),
            cors_methods: "*".to_string(),
            cors_headers: "*".to_string(),
            enable_request_id: false,
            blob_root: "./data/blobs".to_string(),
            queue_path: ":memory:".to_string(),
            workers: 1,
            job_max_attempts: 3,
            job_base_delay_ms: 0,
            job_max_delay_ms: 0,
            job_retention_hours: 1,
            multitenancy: MultitenancyConfig::default(),
        }
    }
}
