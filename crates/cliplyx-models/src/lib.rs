//! Shared data models for the Cliplyx backend.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs and their lifecycle states
//! - Style presets and target output formats
//! - Candidate window selection
//! - Transcript segments and subtitle rendering
//! - Persisted clip records

pub mod clip;
pub mod job;
pub mod style;
pub mod subtitle;
pub mod transcript;
pub mod window;

// Re-export common types
pub use clip::{ClipFormat, ClipRecord, FormatParseError};
pub use job::{JobId, JobRecord, JobStatus};
pub use style::{StyleParseError, StylePreset};
pub use subtitle::{filter_window_segments, format_srt_time, render_srt};
pub use transcript::{sort_and_validate, TranscriptError, TranscriptSegment};
pub use window::{select_windows, CandidateWindow};
