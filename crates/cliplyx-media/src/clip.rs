//! Clip cutting and reformatting.

use std::path::Path;
use tracing::info;

use cliplyx_models::ClipFormat;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Build the scale/crop filter for a target format.
///
/// Scales to cover the target box (preserving the source aspect), then
/// center-crops to the exact resolution so output frames are always
/// `width x height` regardless of the source aspect.
pub fn format_filter(format: ClipFormat) -> String {
    let (width, height) = format.resolution();
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h}",
        w = width,
        h = height
    )
}

/// Cut `[start, end)` from the source and re-encode to the target format.
///
/// Fast, web-optimized encode: libx264 `-preset fast -crf 23`, aac audio,
/// `+faststart` for progressive playback.
pub async fn cut_clip(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    start: f64,
    end: f64,
    format: ClipFormat,
) -> MediaResult<()> {
    let input = input.as_ref();
    let output = output.as_ref();

    if end <= start {
        return Err(MediaError::InvalidVideo(format!(
            "Invalid window: start {start}s, end {end}s"
        )));
    }

    info!(
        "Cutting clip: {} -> {} ({:.1}s-{:.1}s, {})",
        input.display(),
        output.display(),
        start,
        end,
        format
    );

    let cmd = FfmpegCommand::new(input, output)
        .seek(start)
        .duration(end - start)
        .video_filter(format_filter(format))
        .video_codec("libx264")
        .preset("fast")
        .crf(23)
        .audio_codec("aac")
        .output_args(["-movflags", "+faststart"]);

    FfmpegRunner::new().run(&cmd).await?;

    info!("Clip created: {}", output.display());
    Ok(())
}
