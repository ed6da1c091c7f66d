//! Background job pipeline: durable queue, retry policy, and dispatcher.

mod dispatcher;
mod job;
mod queue;

pub use dispatcher::{DispatcherHandle, JobDispatcher, JobHandler, RetryPolicy};
pub use job::{JobId, JobRecord, JobStatus};
pub use queue::{QueueConfig, SqliteJobQueue};
