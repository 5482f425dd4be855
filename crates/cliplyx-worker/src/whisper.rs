//! Whisper speech-to-text client.
//!
//! Posts extracted audio to an OpenAI-compatible `audio/transcriptions`
//! endpoint and parses the `verbose_json` response into transcript
//! segments.

use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use cliplyx_models::TranscriptSegment;

use crate::error::{WorkerError, WorkerResult};

const DEFAULT_API_URL: &str = "https://api.openai.com/v1";
const WHISPER_MODEL: &str = "whisper-1";

/// Speech-to-text seam for the pipeline.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe an audio file into timestamped segments.
    async fn transcribe(&self, audio_path: &Path) -> WorkerResult<Vec<TranscriptSegment>>;
}

/// Whisper `verbose_json` response.
#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    #[allow(dead_code)]
    text: String,
    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    start: f64,
    end: f64,
    text: String,
}

/// Whisper API client.
pub struct WhisperClient {
    api_key: String,
    base_url: String,
    client: Client,
}

impl WhisperClient {
    /// Create a new Whisper client from environment variables.
    pub fn from_env() -> WorkerResult<Self> {
        let api_key = std::env::var("WHISPER_API_KEY")
            .map_err(|_| WorkerError::config_error("WHISPER_API_KEY not set"))?;
        let base_url =
            std::env::var("WHISPER_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        Ok(Self::new(api_key, base_url))
    }

    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl SpeechToText for WhisperClient {
    async fn transcribe(&self, audio_path: &Path) -> WorkerResult<Vec<TranscriptSegment>> {
        info!("Transcribing {}", audio_path.display());

        let audio = tokio::fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio.mp3".to_string());

        let file_part = multipart::Part::bytes(audio)
            .file_name(file_name)
            .mime_str("audio/mpeg")?;

        let form = multipart::Form::new()
            .part("file", file_part)
            .text("model", WHISPER_MODEL)
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "segment");

        let url = format!("{}/audio/transcriptions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WorkerError::job_failed(format!(
                "Whisper API error {status}: {body}"
            )));
        }

        let transcription: VerboseTranscription = response.json().await?;
        debug!("Whisper returned {} segments", transcription.segments.len());

        Ok(transcription
            .segments
            .into_iter()
            .map(|s| TranscriptSegment::new(s.start, s.end, s.text.trim()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn write_fake_audio(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("audio.mp3");
        std::fs::write(&path, b"not really audio").unwrap();
        path
    }

    #[tokio::test]
    async fn test_transcribe_parses_segments() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "text": "hello world again",
                "segments": [
                    { "id": 0, "start": 0.0, "end": 2.5, "text": " hello world" },
                    { "id": 1, "start": 2.5, "end": 4.0, "text": " again" }
                ]
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let audio = write_fake_audio(&dir);

        let client = WhisperClient::new("test-key", server.uri());
        let segments = client.transcribe(&audio).await.unwrap();

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].start, 0.0);
        assert_eq!(segments[0].end, 2.5);
        assert_eq!(segments[0].text, "hello world");
        assert_eq!(segments[1].text, "again");
    }

    #[tokio::test]
    async fn test_transcribe_surfaces_api_errors() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let audio = write_fake_audio(&dir);

        let client = WhisperClient::new("test-key", server.uri());
        let err = client.transcribe(&audio).await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_transcribe_handles_empty_segments() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "text": ""
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let audio = write_fake_audio(&dir);

        let client = WhisperClient::new("test-key", server.uri());
        let segments = client.transcribe(&audio).await.unwrap();
        assert!(segments.is_empty());
    }
}
