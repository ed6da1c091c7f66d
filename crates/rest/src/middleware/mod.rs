//! Axum middleware for the Vellum HTTP API.

pub mod tenant;

pub use tenant::tenant_middleware;
