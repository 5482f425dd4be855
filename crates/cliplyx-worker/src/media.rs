//! Media engine seam for the pipeline.

use std::path::Path;

use async_trait::async_trait;

use cliplyx_media::VideoInfo;
use cliplyx_models::ClipFormat;

use crate::error::WorkerResult;

/// Transcode operations the pipeline needs.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Probe a video file for duration, dimensions, and size.
    async fn probe(&self, input: &Path) -> WorkerResult<VideoInfo>;
    /// Extract the audio track as MP3.
    async fn extract_audio(&self, input: &Path, output: &Path) -> WorkerResult<()>;
    /// Cut `[start, end)` and re-encode to the given format.
    async fn cut_clip(
        &self,
        input: &Path,
        output: &Path,
        start: f64,
        end: f64,
        format: ClipFormat,
    ) -> WorkerResult<()>;
}

/// FFmpeg-backed media engine.
pub struct FfmpegEngine;

#[async_trait]
impl MediaEngine for FfmpegEngine {
    async fn probe(&self, input: &Path) -> WorkerResult<VideoInfo> {
        Ok(cliplyx_media::probe_video(input).await?)
    }

    async fn extract_audio(&self, input: &Path, output: &Path) -> WorkerResult<()> {
        cliplyx_media::extract_audio(input, output).await?;
        Ok(())
    }

    async fn cut_clip(
        &self,
        input: &Path,
        output: &Path,
        start: f64,
        end: f64,
        format: ClipFormat,
    ) -> WorkerResult<()> {
        cliplyx_media::cut_clip(input, output, start, end, format).await?;
        Ok(())
    }
}
