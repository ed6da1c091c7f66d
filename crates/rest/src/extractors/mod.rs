//! Axum extractors for the Vellum HTTP API.

mod tenant;

pub use tenant::TenantExtractor;
