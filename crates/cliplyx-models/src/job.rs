//! Job records and lifecycle states.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::{ClipFormat, StylePreset};

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job lifecycle status.
///
/// `Pending` is written by the API at enqueue time; every transition after
/// that belongs to the worker that claims the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Job is queued waiting for a worker
    #[default]
    Pending,
    /// Job is actively being processed
    Processing,
    /// Job completed successfully
    Completed,
    /// Job failed with an error
    Failed,
}

impl JobStatus {
    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Processing => "PROCESSING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Persisted job record.
///
/// Exclusively mutated by the worker while the job is in flight; the API
/// only reads it for status polling.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JobRecord {
    /// Unique job identifier
    pub id: JobId,
    /// User who owns this job
    pub user_id: String,
    /// Object storage key of the source video
    pub source_key: String,
    /// Source video duration in seconds
    pub duration_seconds: f64,
    /// Windowing style preset
    pub style: StylePreset,
    /// Requested output formats
    pub formats: Vec<ClipFormat>,
    /// Current job status
    pub status: JobStatus,
    /// Progress percentage (0-100, monotonically non-decreasing while processing)
    pub progress: u8,
    /// Error message if the job failed
    pub error_message: Option<String>,
    /// Descriptions of clip units that failed while the job itself completed
    #[serde(default)]
    pub unit_failures: Vec<String>,
    /// When the job was created
    pub created_at: DateTime<Utc>,
    /// When the record was last updated
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    /// Create a new pending job record.
    pub fn new(
        id: JobId,
        user_id: impl Into<String>,
        source_key: impl Into<String>,
        duration_seconds: f64,
        style: StylePreset,
        formats: Vec<ClipFormat>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id: user_id.into(),
            source_key: source_key.into(),
            duration_seconds,
            style,
            formats,
            status: JobStatus::Pending,
            progress: 0,
            error_message: None,
            unit_failures: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Mark the job as processing, resetting progress.
    pub fn start(&mut self) {
        self.status = JobStatus::Processing;
        self.progress = 0;
        self.updated_at = Utc::now();
    }

    /// Update progress. Progress never moves backwards while processing.
    pub fn set_progress(&mut self, progress: u8) {
        self.progress = self.progress.max(progress.min(100));
        self.updated_at = Utc::now();
    }

    /// Mark job as completed.
    pub fn complete(&mut self) {
        self.status = JobStatus::Completed;
        self.progress = 100;
        self.updated_at = Utc::now();
    }

    /// Record a clip unit that failed without failing the whole job.
    pub fn record_unit_failure(&mut self, description: impl Into<String>) {
        self.unit_failures.push(description.into());
        self.updated_at = Utc::now();
    }

    /// Mark job as failed with an error message.
    ///
    /// Progress is preserved at its last value so a partially processed job
    /// is distinguishable from one that failed before doing any work.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = JobStatus::Failed;
        self.error_message = Some(error.into());
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> JobRecord {
        JobRecord::new(
            JobId::from_string("job-1"),
            "user-1",
            "user-1/uploads/video.mp4",
            120.0,
            StylePreset::Viral,
            vec![ClipFormat::Vertical],
        )
    }

    #[test]
    fn test_new_record_is_pending() {
        let job = record();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.progress, 0);
        assert!(!job.is_terminal());
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut job = record();

        job.start();
        assert_eq!(job.status, JobStatus::Processing);

        job.set_progress(40);
        assert_eq!(job.progress, 40);

        job.complete();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100);
        assert!(job.is_terminal());
    }

    #[test]
    fn test_progress_is_monotonic() {
        let mut job = record();
        job.start();
        job.set_progress(40);
        job.set_progress(20);
        assert_eq!(job.progress, 40);
        job.set_progress(200);
        assert_eq!(job.progress, 100);
    }

    #[test]
    fn test_failure_preserves_progress() {
        let mut job = record();
        job.start();
        job.set_progress(65);
        job.fail("transcode exploded");
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.progress, 65);
        assert_eq!(job.error_message.as_deref(), Some("transcode exploded"));
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Processing).unwrap(),
            "\"PROCESSING\""
        );
        assert_eq!(JobStatus::Failed.as_str(), "FAILED");
    }
}
