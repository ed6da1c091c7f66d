//! HTTP request handlers for the Vellum API.

pub mod documents;
pub mod health;
pub mod jobs;

pub use documents::{delete_handler, download_handler, upload_handler};
pub use health::{health_handler, liveness_handler, readiness_handler};
pub use jobs::job_status_handler;
