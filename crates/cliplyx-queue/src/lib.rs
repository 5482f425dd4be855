//! Redis Streams job queue.
//!
//! This crate provides:
//! - Job enqueueing via Redis Streams with idempotency keys
//! - Worker consumption through a consumer group
//! - Attempt counting with exponential re-delivery backoff
//! - Dead letter queue for exhausted jobs

pub mod error;
pub mod job;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use job::ProcessVideoJob;
pub use queue::{eligible_for_claim, retry_backoff, JobQueue, QueueConfig};
