//! End-to-end pipeline tests over in-memory fakes.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use cliplyx_models::{
    ClipFormat, ClipRecord, JobId, JobRecord, JobStatus, StylePreset, TranscriptSegment,
};
use cliplyx_queue::ProcessVideoJob;
use cliplyx_worker::{
    BlobStore, ClipStore, JobStore, MediaEngine, Pipeline, SpeechToText, WorkerError, WorkerResult,
};

#[derive(Default)]
struct MemoryJobStore {
    jobs: Mutex<HashMap<String, JobRecord>>,
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn load(&self, job_id: &JobId) -> WorkerResult<Option<JobRecord>> {
        Ok(self.jobs.lock().unwrap().get(job_id.as_str()).cloned())
    }

    async fn save(&self, job: &JobRecord) -> WorkerResult<()> {
        self.jobs
            .lock()
            .unwrap()
            .insert(job.id.to_string(), job.clone());
        Ok(())
    }
}

#[derive(Default)]
struct MemoryClipStore {
    clips: Mutex<Vec<ClipRecord>>,
}

#[async_trait]
impl ClipStore for MemoryClipStore {
    async fn create(&self, clip: &ClipRecord) -> WorkerResult<()> {
        self.clips.lock().unwrap().push(clip.clone());
        Ok(())
    }

    async fn list_for_job(&self, job_id: &JobId) -> WorkerResult<Vec<ClipRecord>> {
        Ok(self
            .clips
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.job_id == *job_id)
            .cloned()
            .collect())
    }
}

/// Blob store that records uploads instead of talking to S3.
#[derive(Default)]
struct MemoryBlobStore {
    uploads: Mutex<Vec<String>>,
    captions: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn download_source(&self, _key: &str, dest: &Path) -> WorkerResult<()> {
        tokio::fs::write(dest, b"source video bytes").await?;
        Ok(())
    }

    async fn upload_clip(&self, _path: &Path, key: &str) -> WorkerResult<()> {
        self.uploads.lock().unwrap().push(key.to_string());
        Ok(())
    }

    async fn upload_captions(&self, content: &str, key: &str) -> WorkerResult<()> {
        self.captions
            .lock()
            .unwrap()
            .insert(key.to_string(), content.to_string());
        Ok(())
    }
}

/// Media engine that writes marker files instead of invoking ffmpeg.
struct FakeMedia {
    /// When set, fails every cut for vertical output
    fail_vertical: AtomicBool,
}

impl FakeMedia {
    fn new() -> Self {
        Self {
            fail_vertical: AtomicBool::new(false),
        }
    }

    fn failing_vertical() -> Self {
        Self {
            fail_vertical: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl MediaEngine for FakeMedia {
    async fn probe(&self, _input: &Path) -> WorkerResult<cliplyx_media::VideoInfo> {
        Ok(cliplyx_media::VideoInfo {
            duration: 50.0,
            width: 1920,
            height: 1080,
            size: 18,
        })
    }

    async fn extract_audio(&self, _input: &Path, output: &Path) -> WorkerResult<()> {
        tokio::fs::write(output, b"audio bytes").await?;
        Ok(())
    }

    async fn cut_clip(
        &self,
        _input: &Path,
        output: &Path,
        _start: f64,
        _end: f64,
        format: ClipFormat,
    ) -> WorkerResult<()> {
        if format == ClipFormat::Vertical && self.fail_vertical.load(Ordering::SeqCst) {
            return Err(WorkerError::unit_failed("encoder crashed"));
        }
        tokio::fs::write(output, b"encoded clip bytes").await?;
        Ok(())
    }
}

struct ScriptedStt {
    segments: Vec<TranscriptSegment>,
}

#[async_trait]
impl SpeechToText for ScriptedStt {
    async fn transcribe(&self, _audio: &Path) -> WorkerResult<Vec<TranscriptSegment>> {
        Ok(self.segments.clone())
    }
}

struct Harness {
    jobs: Arc<MemoryJobStore>,
    clips: Arc<MemoryClipStore>,
    blobs: Arc<MemoryBlobStore>,
    pipeline: Pipeline,
    _work_root: tempfile::TempDir,
}

fn harness(media: FakeMedia, segments: Vec<TranscriptSegment>) -> Harness {
    let jobs = Arc::new(MemoryJobStore::default());
    let clips = Arc::new(MemoryClipStore::default());
    let blobs = Arc::new(MemoryBlobStore::default());
    let work_root = tempfile::tempdir().unwrap();

    let pipeline = Pipeline::new(
        jobs.clone(),
        clips.clone(),
        blobs.clone(),
        Arc::new(media),
        Arc::new(ScriptedStt { segments }),
        work_root.path(),
        2,
    );

    Harness {
        jobs,
        clips,
        blobs,
        pipeline,
        _work_root: work_root,
    }
}

fn payload(duration: f64, style: StylePreset, formats: Vec<ClipFormat>) -> ProcessVideoJob {
    ProcessVideoJob::new("user-1", "user-1/uploads/video.mp4", duration, style, formats)
}

fn speech() -> Vec<TranscriptSegment> {
    vec![
        TranscriptSegment::new(1.0, 4.0, "welcome back"),
        TranscriptSegment::new(16.0, 19.0, "the big reveal"),
        TranscriptSegment::new(31.0, 34.0, "wrapping up"),
    ]
}

#[tokio::test]
async fn viral_job_produces_one_clip_per_window_and_format() {
    let h = harness(FakeMedia::new(), speech());
    let job = payload(50.0, StylePreset::Viral, vec![ClipFormat::Vertical]);

    h.pipeline.process(&job).await.unwrap();

    // 50s viral: windows [0,20], [15,35], [30,50]
    let clips = h.clips.list_for_job(&job.job_id).await.unwrap();
    assert_eq!(clips.len(), 3);
    assert_eq!(clips.iter().filter(|c| c.format == ClipFormat::Vertical).count(), 3);

    let stored = h.jobs.jobs.lock().unwrap();
    let record = stored.get(job.job_id.as_str()).unwrap();
    assert_eq!(record.status, JobStatus::Completed);
    assert_eq!(record.progress, 100);
    assert!(record.unit_failures.is_empty());
}

#[tokio::test]
async fn clip_records_carry_window_captions() {
    let h = harness(FakeMedia::new(), speech());
    let job = payload(50.0, StylePreset::Viral, vec![ClipFormat::Feed]);

    h.pipeline.process(&job).await.unwrap();

    let clips = h.clips.clips.lock().unwrap();
    let first = clips
        .iter()
        .find(|c| c.start_time == 0.0)
        .expect("window [0,20] clip");

    // Segments at 1-4s and 16-19s fall inside [0,20]; 31-34s does not
    assert_eq!(first.transcription, "welcome back the big reveal");
    assert_eq!(first.duration, 20.0);
    assert_eq!(
        first.clip_key,
        format!("user-1/{}/clip-0-feed.mp4", job.job_id)
    );

    let captions = h.blobs.captions.lock().unwrap();
    let srt = captions.get(&first.captions_key).unwrap();
    assert!(srt.starts_with("1\n00:00:01,000 --> 00:00:04,000\nwelcome back\n"));
}

#[tokio::test]
async fn multi_format_job_uploads_every_artifact() {
    let h = harness(FakeMedia::new(), speech());
    let job = payload(
        50.0,
        StylePreset::Viral,
        vec![ClipFormat::Vertical, ClipFormat::Landscape],
    );

    h.pipeline.process(&job).await.unwrap();

    // 3 windows x 2 formats
    assert_eq!(h.clips.clips.lock().unwrap().len(), 6);
    assert_eq!(h.blobs.uploads.lock().unwrap().len(), 6);
    assert_eq!(h.blobs.captions.lock().unwrap().len(), 6);
}

#[tokio::test]
async fn short_source_completes_with_no_clips() {
    let h = harness(FakeMedia::new(), speech());
    // 10s source cannot fit a 20s viral window
    let job = payload(10.0, StylePreset::Viral, vec![ClipFormat::Vertical]);

    h.pipeline.process(&job).await.unwrap();

    assert!(h.clips.clips.lock().unwrap().is_empty());
    let stored = h.jobs.jobs.lock().unwrap();
    let record = stored.get(job.job_id.as_str()).unwrap();
    assert_eq!(record.status, JobStatus::Completed);
    assert_eq!(record.progress, 100);
}

#[tokio::test]
async fn failed_unit_is_isolated_and_recorded() {
    let h = harness(FakeMedia::failing_vertical(), speech());
    let job = payload(
        50.0,
        StylePreset::Viral,
        vec![ClipFormat::Vertical, ClipFormat::Feed],
    );

    h.pipeline.process(&job).await.unwrap();

    // Vertical units fail, feed units survive
    let clips = h.clips.clips.lock().unwrap();
    assert_eq!(clips.len(), 3);
    assert!(clips.iter().all(|c| c.format == ClipFormat::Feed));

    let stored = h.jobs.jobs.lock().unwrap();
    let record = stored.get(job.job_id.as_str()).unwrap();
    assert_eq!(record.status, JobStatus::Completed);
    assert_eq!(record.unit_failures.len(), 3);
    assert!(record.unit_failures[0].contains("encoder crashed"));
}

#[tokio::test]
async fn all_units_failing_fails_the_job_and_preserves_progress() {
    let h = harness(FakeMedia::failing_vertical(), speech());
    let job = payload(50.0, StylePreset::Viral, vec![ClipFormat::Vertical]);

    let err = h.pipeline.process(&job).await.unwrap_err();
    assert!(err.to_string().contains("All 3 clip units failed"));

    let stored = h.jobs.jobs.lock().unwrap();
    let record = stored.get(job.job_id.as_str()).unwrap();
    assert_eq!(record.status, JobStatus::Failed);
    // Progress reached at least the transcription milestone and is preserved
    assert!(record.progress >= 40);
    assert!(record.error_message.as_deref().unwrap().contains("failed"));
}

#[tokio::test]
async fn auto_style_cycles_window_lengths() {
    let h = harness(FakeMedia::new(), speech());
    let job = payload(105.0, StylePreset::Auto, vec![ClipFormat::Vertical]);

    h.pipeline.process(&job).await.unwrap();

    let clips = h.clips.clips.lock().unwrap();
    // Auto over 105s: [0,30], [20,80], and a 90s window cut at the source end
    let mut spans: Vec<(f64, f64)> = clips.iter().map(|c| (c.start_time, c.end_time)).collect();
    spans.sort_by(|a, b| a.0.total_cmp(&b.0));
    assert_eq!(spans, vec![(0.0, 30.0), (20.0, 80.0), (70.0, 105.0)]);
}

#[tokio::test]
async fn workdir_is_removed_after_success() {
    let jobs = Arc::new(MemoryJobStore::default());
    let clips = Arc::new(MemoryClipStore::default());
    let blobs = Arc::new(MemoryBlobStore::default());
    let work_root = tempfile::tempdir().unwrap();

    let pipeline = Pipeline::new(
        jobs,
        clips,
        blobs,
        Arc::new(FakeMedia::new()),
        Arc::new(ScriptedStt { segments: speech() }),
        work_root.path(),
        2,
    );

    let job = payload(50.0, StylePreset::Viral, vec![ClipFormat::Vertical]);
    pipeline.process(&job).await.unwrap();

    assert!(!work_root.path().join(job.job_id.as_str()).exists());
}
