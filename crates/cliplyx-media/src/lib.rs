//! FFmpeg CLI wrapper for video processing.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Audio-only track extraction for transcription
//! - Clip cutting with per-format scaling and re-encoding
//! - FFprobe metadata probing
//! - Job-scoped scratch directories with guaranteed cleanup

pub mod audio;
pub mod clip;
pub mod command;
pub mod error;
pub mod probe;
pub mod workdir;

pub use audio::extract_audio;
pub use clip::cut_clip;
pub use command::{FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use probe::{probe_video, VideoInfo};
pub use workdir::WorkDir;
