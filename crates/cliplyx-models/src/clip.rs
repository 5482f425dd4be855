//! Clip formats and persisted clip records.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::JobId;

/// Target output format (aspect ratio / resolution profile).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClipFormat {
    /// 1080x1920 portrait (9:16) for Shorts/Reels/TikTok
    Vertical,
    /// 1080x1080 square (1:1) for feed posts
    Feed,
    /// 1920x1080 landscape (16:9)
    Landscape,
}

impl ClipFormat {
    /// All available formats.
    pub const ALL: &'static [ClipFormat] =
        &[ClipFormat::Vertical, ClipFormat::Feed, ClipFormat::Landscape];

    /// Output resolution as (width, height).
    pub fn resolution(&self) -> (u32, u32) {
        match self {
            ClipFormat::Vertical => (1080, 1920),
            ClipFormat::Feed => (1080, 1080),
            ClipFormat::Landscape => (1920, 1080),
        }
    }

    /// Display aspect ratio string, e.g. "9:16".
    pub fn aspect_ratio(&self) -> &'static str {
        match self {
            ClipFormat::Vertical => "9:16",
            ClipFormat::Feed => "1:1",
            ClipFormat::Landscape => "16:9",
        }
    }

    /// Get string representation (used in storage keys).
    pub fn as_str(&self) -> &'static str {
        match self {
            ClipFormat::Vertical => "vertical",
            ClipFormat::Feed => "feed",
            ClipFormat::Landscape => "landscape",
        }
    }
}

impl fmt::Display for ClipFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error parsing a clip format from a string.
#[derive(Debug, Error)]
#[error("Unknown clip format: {0}")]
pub struct FormatParseError(pub String);

impl FromStr for ClipFormat {
    type Err = FormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "vertical" => Ok(ClipFormat::Vertical),
            "feed" => Ok(ClipFormat::Feed),
            "landscape" => Ok(ClipFormat::Landscape),
            _ => Err(FormatParseError(s.to_string())),
        }
    }
}

/// One persisted clip artifact.
///
/// Created once per successfully transcoded (window, format) pair and never
/// mutated by the pipeline afterwards. The view/download counters belong to
/// the delivery layer.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClipRecord {
    /// Parent job
    pub job_id: JobId,
    /// Output format
    pub format: ClipFormat,
    /// Window start in seconds
    pub start_time: f64,
    /// Window end in seconds
    pub end_time: f64,
    /// Clip duration in seconds (end - start)
    pub duration: f64,
    /// Encoded media size in bytes
    pub size_bytes: u64,
    /// Object storage key of the media file
    pub clip_key: String,
    /// Object storage key of the caption file
    pub captions_key: String,
    /// Concatenated caption text for this window
    pub transcription: String,
    /// View counter (mutated by the delivery layer)
    pub views: u64,
    /// Download counter (mutated by the delivery layer)
    pub downloads: u64,
    /// When the clip was created
    pub created_at: DateTime<Utc>,
}

impl ClipRecord {
    /// Create a new clip record with zeroed counters.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        job_id: JobId,
        format: ClipFormat,
        start_time: f64,
        end_time: f64,
        size_bytes: u64,
        clip_key: impl Into<String>,
        captions_key: impl Into<String>,
        transcription: impl Into<String>,
    ) -> Self {
        Self {
            job_id,
            format,
            start_time,
            end_time,
            duration: end_time - start_time,
            size_bytes,
            clip_key: clip_key.into(),
            captions_key: captions_key.into(),
            transcription: transcription.into(),
            views: 0,
            downloads: 0,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_resolutions() {
        assert_eq!(ClipFormat::Vertical.resolution(), (1080, 1920));
        assert_eq!(ClipFormat::Feed.resolution(), (1080, 1080));
        assert_eq!(ClipFormat::Landscape.resolution(), (1920, 1080));
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("VERTICAL".parse::<ClipFormat>().unwrap(), ClipFormat::Vertical);
        assert!("diagonal".parse::<ClipFormat>().is_err());
    }

    #[test]
    fn test_clip_record_derives_duration_and_zero_counters() {
        let clip = ClipRecord::new(
            JobId::from_string("job-1"),
            ClipFormat::Feed,
            15.0,
            35.0,
            1024,
            "user/job-1/clip-15-feed.mp4",
            "user/job-1/clip-15-feed.srt",
            "hello world",
        );
        assert_eq!(clip.duration, 20.0);
        assert_eq!(clip.views, 0);
        assert_eq!(clip.downloads, 0);
    }
}
