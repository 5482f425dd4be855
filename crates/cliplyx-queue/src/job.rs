//! Job payload types for the queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cliplyx_models::{ClipFormat, JobId, StylePreset};

/// Job to process an uploaded video into clips.
///
/// This is the full queue payload; the worker never re-reads job parameters
/// from the store, so everything the pipeline needs travels with the job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessVideoJob {
    /// Unique job ID (also the queue-level dedup key)
    pub job_id: JobId,
    /// User ID
    pub user_id: String,
    /// Object storage key of the source video
    pub source_key: String,
    /// Source video duration in seconds
    pub duration_seconds: f64,
    /// Windowing style preset
    pub style: StylePreset,
    /// Requested output formats
    pub formats: Vec<ClipFormat>,
    /// When the job was created
    pub created_at: DateTime<Utc>,
}

impl ProcessVideoJob {
    /// Create a new process job.
    pub fn new(
        user_id: impl Into<String>,
        source_key: impl Into<String>,
        duration_seconds: f64,
        style: StylePreset,
        formats: Vec<ClipFormat>,
    ) -> Self {
        Self {
            job_id: JobId::new(),
            user_id: user_id.into(),
            source_key: source_key.into(),
            duration_seconds,
            style,
            formats,
            created_at: Utc::now(),
        }
    }

    /// Use an existing job ID (the API pre-creates the job record).
    pub fn with_job_id(mut self, job_id: JobId) -> Self {
        self.job_id = job_id;
        self
    }

    /// Generate idempotency key for deduplication.
    ///
    /// The job id itself is the dedup key: re-submitting the same job while
    /// it is in flight is rejected, a new attempt at the same video gets a
    /// fresh id.
    pub fn idempotency_key(&self) -> String {
        format!("process:{}", self.job_id)
    }
}
