//! Audio extraction and transcription with retry.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use cliplyx_models::{sort_and_validate, TranscriptSegment};

use crate::error::{WorkerError, WorkerResult};
use crate::media::MediaEngine;
use crate::whisper::SpeechToText;

/// Maximum audio payload the transcription API accepts.
pub const MAX_AUDIO_BYTES: u64 = 25 * 1024 * 1024;

/// Maximum transcription attempts before giving up.
pub const MAX_TRANSCRIPTION_ATTEMPTS: u32 = 3;

/// Delay before retrying after the given failed attempt (1-based).
///
/// Doubles per attempt with no cap: 2s after the first failure, 4s after
/// the second.
pub fn transcription_backoff(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt))
}

/// Extracts audio from a source video and transcribes it.
pub struct Transcriber {
    media: Arc<dyn MediaEngine>,
    stt: Arc<dyn SpeechToText>,
}

impl Transcriber {
    pub fn new(media: Arc<dyn MediaEngine>, stt: Arc<dyn SpeechToText>) -> Self {
        Self { media, stt }
    }

    /// Extract the audio track and produce a validated, time-ordered
    /// transcript.
    ///
    /// Audio larger than [`MAX_AUDIO_BYTES`] is a terminal
    /// [`WorkerError::Unsupported`]; no transcription attempt is made.
    /// Transient API failures are retried up to
    /// [`MAX_TRANSCRIPTION_ATTEMPTS`] times with doubling delays.
    pub async fn transcribe_source(
        &self,
        source: &Path,
        audio_output: &Path,
    ) -> WorkerResult<Vec<TranscriptSegment>> {
        self.media.extract_audio(source, audio_output).await?;

        let audio_size = tokio::fs::metadata(audio_output).await?.len();
        if audio_size > MAX_AUDIO_BYTES {
            return Err(WorkerError::unsupported(format!(
                "Extracted audio is {} bytes, exceeding the {} byte transcription limit",
                audio_size, MAX_AUDIO_BYTES
            )));
        }

        let segments = self.transcribe_with_retry(audio_output).await?;

        // Audio is only needed for the API call
        if let Err(e) = tokio::fs::remove_file(audio_output).await {
            warn!("Failed to remove extracted audio {}: {}", audio_output.display(), e);
        }

        Ok(sort_and_validate(segments)?)
    }

    async fn transcribe_with_retry(
        &self,
        audio: &Path,
    ) -> WorkerResult<Vec<TranscriptSegment>> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.stt.transcribe(audio).await {
                Ok(segments) => {
                    info!(
                        "Transcription succeeded on attempt {} with {} segments",
                        attempt,
                        segments.len()
                    );
                    return Ok(segments);
                }
                Err(e) if attempt >= MAX_TRANSCRIPTION_ATTEMPTS => {
                    return Err(WorkerError::TranscriptionFailed {
                        message: e.to_string(),
                        attempts: attempt,
                    });
                }
                Err(e) => {
                    let delay = transcription_backoff(attempt);
                    warn!(
                        "Transcription attempt {} failed ({}), retrying in {:?}",
                        attempt, e, delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
