//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Transcription failed after {attempts} attempts: {message}")]
    TranscriptionFailed { message: String, attempts: u32 },

    #[error("Unsupported input: {0}")]
    Unsupported(String),

    #[error("Clip unit failed: {0}")]
    UnitFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    Storage(#[from] cliplyx_storage::StorageError),

    #[error("Media error: {0}")]
    Media(#[from] cliplyx_media::MediaError),

    #[error("Queue error: {0}")]
    Queue(#[from] cliplyx_queue::QueueError),

    #[error("Transcript error: {0}")]
    Transcript(#[from] cliplyx_models::TranscriptError),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }

    pub fn download_failed(msg: impl Into<String>) -> Self {
        Self::DownloadFailed(msg.into())
    }

    pub fn upload_failed(msg: impl Into<String>) -> Self {
        Self::UploadFailed(msg.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    pub fn unit_failed(msg: impl Into<String>) -> Self {
        Self::UnitFailed(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Check if error is retryable at the queue level.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WorkerError::DownloadFailed(_)
                | WorkerError::UploadFailed(_)
                | WorkerError::Storage(_)
                | WorkerError::Redis(_)
                | WorkerError::Http(_)
                | WorkerError::TranscriptionFailed { .. }
        )
    }

    /// Check if this is a permanent failure that must NOT be retried.
    ///
    /// The input itself is unprocessable; redelivery cannot change the
    /// outcome.
    pub fn is_permanent_failure(&self) -> bool {
        matches!(
            self,
            WorkerError::Unsupported(_) | WorkerError::Transcript(_)
        )
    }
}
