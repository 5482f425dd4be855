//! Clip production worker.
//!
//! This crate provides:
//! - Job executor pulling process-video jobs from the queue
//! - The clip production pipeline (download, window, transcribe, transcode)
//! - Capability seams for storage, media tooling, and speech-to-text
//! - Graceful shutdown

pub mod blob;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod media;
pub mod pipeline;
pub mod store;
pub mod transcriber;
pub mod whisper;

pub use blob::{BlobStore, S3BlobStore};
pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use logging::JobLogger;
pub use media::{FfmpegEngine, MediaEngine};
pub use pipeline::Pipeline;
pub use store::{ClipStore, JobStore, RedisStore};
pub use transcriber::Transcriber;
pub use whisper::{SpeechToText, WhisperClient};
