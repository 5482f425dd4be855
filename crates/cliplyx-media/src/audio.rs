//! Audio track extraction for transcription.

use std::path::Path;
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Extract an audio-only mp3 track from a video file.
///
/// The speech-to-text engine only needs compressed audio; 128k mp3 keeps
/// the upload small without hurting recognition quality.
pub async fn extract_audio(input: impl AsRef<Path>, output: impl AsRef<Path>) -> MediaResult<()> {
    let input = input.as_ref();
    let output = output.as_ref();

    info!(
        "Extracting audio: {} -> {}",
        input.display(),
        output.display()
    );

    let cmd = FfmpegCommand::new(input, output)
        .no_video()
        .audio_codec("libmp3lame")
        .audio_bitrate("128k");

    FfmpegRunner::new().run(&cmd).await?;

    info!("Audio extraction completed: {}", output.display());
    Ok(())
}
