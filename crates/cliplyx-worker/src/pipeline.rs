//! Clip production pipeline.
//!
//! Drives one job end to end: download the source, compute candidate
//! windows, transcribe once, then fan out over (window, format) units that
//! cut, caption, upload, and persist each clip. Progress and status updates
//! are written through the job store at every milestone.

use std::path::PathBuf;
use std::sync::Arc;

use metrics::counter;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use cliplyx_media::WorkDir;
use cliplyx_models::{
    filter_window_segments, render_srt, select_windows, CandidateWindow, ClipFormat, ClipRecord,
    JobRecord, TranscriptSegment,
};
use cliplyx_queue::ProcessVideoJob;
use cliplyx_storage::{captions_key, clip_key};

use crate::blob::BlobStore;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::media::MediaEngine;
use crate::store::{ClipStore, JobStore};
use crate::transcriber::Transcriber;
use crate::whisper::SpeechToText;

/// Pipeline over the worker's capability seams.
pub struct Pipeline {
    jobs: Arc<dyn JobStore>,
    clips: Arc<dyn ClipStore>,
    blobs: Arc<dyn BlobStore>,
    media: Arc<dyn MediaEngine>,
    stt: Arc<dyn SpeechToText>,
    work_root: PathBuf,
    max_unit_parallel: usize,
}

/// One (window, format) unit of work.
struct ClipUnit {
    window: CandidateWindow,
    format: ClipFormat,
}

impl Pipeline {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        clips: Arc<dyn ClipStore>,
        blobs: Arc<dyn BlobStore>,
        media: Arc<dyn MediaEngine>,
        stt: Arc<dyn SpeechToText>,
        work_root: impl Into<PathBuf>,
        max_unit_parallel: usize,
    ) -> Self {
        Self {
            jobs,
            clips,
            blobs,
            media,
            stt,
            work_root: work_root.into(),
            max_unit_parallel: max_unit_parallel.max(1),
        }
    }

    /// Process one delivered job.
    ///
    /// On failure the job record is marked FAILED with its progress
    /// preserved, and the error is returned so the queue layer can apply
    /// its retry policy.
    pub async fn process(&self, payload: &ProcessVideoJob) -> WorkerResult<()> {
        let logger = JobLogger::new(&payload.job_id, "process_video");
        logger.log_start(&format!(
            "style={}, formats={:?}, duration={}s",
            payload.style, payload.formats, payload.duration_seconds
        ));

        let mut job = match self.jobs.load(&payload.job_id).await? {
            Some(job) => job,
            // Intake normally creates the record; tolerate a missing one
            None => JobRecord::new(
                payload.job_id.clone(),
                payload.user_id.clone(),
                payload.source_key.clone(),
                payload.duration_seconds,
                payload.style,
                payload.formats.clone(),
            ),
        };

        job.start();
        self.jobs.save(&job).await?;

        match self.run(&mut job).await {
            Ok(clips_produced) => {
                job.complete();
                self.jobs.save(&job).await?;
                counter!("cliplyx_jobs_completed_total").increment(1);
                counter!("cliplyx_clips_produced_total").increment(clips_produced);
                logger.log_completion(&format!("{} clips produced", clips_produced));
                Ok(())
            }
            Err(e) => {
                job.fail(e.to_string());
                self.jobs.save(&job).await?;
                counter!("cliplyx_jobs_failed_total").increment(1);
                logger.log_error(&e.to_string());
                Err(e)
            }
        }
    }

    /// The fallible middle of the pipeline. Returns the number of clips
    /// produced.
    async fn run(&self, job: &mut JobRecord) -> WorkerResult<u64> {
        let workdir = WorkDir::create(&self.work_root, job.id.as_str()).await?;

        let source = workdir.join("source.mp4");
        self.blobs.download_source(&job.source_key, &source).await?;

        // Fail early on a corrupt download; the stored duration stays
        // authoritative for windowing
        let info = self.media.probe(&source).await?;
        if (info.duration - job.duration_seconds).abs() > 1.0 {
            warn!(
                job_id = %job.id,
                "Probed duration {:.1}s differs from stored duration {:.1}s",
                info.duration, job.duration_seconds
            );
        }
        job.set_progress(10);
        self.jobs.save(job).await?;

        let windows = select_windows(job.duration_seconds, job.style);
        info!(job_id = %job.id, "Selected {} candidate windows", windows.len());
        job.set_progress(20);
        self.jobs.save(job).await?;

        if windows.is_empty() {
            // Source too short for the preset: a completed job with no clips
            workdir.remove().await?;
            return Ok(0);
        }

        let transcriber = Transcriber::new(Arc::clone(&self.media), Arc::clone(&self.stt));
        let segments: Arc<Vec<TranscriptSegment>> = Arc::new(
            transcriber
                .transcribe_source(&source, &workdir.join("audio.mp3"))
                .await?,
        );
        job.set_progress(40);
        self.jobs.save(job).await?;

        // Fixed unit order: windows outer, formats inner
        let units: Vec<ClipUnit> = windows
            .iter()
            .flat_map(|w| {
                job.formats.iter().map(move |f| ClipUnit {
                    window: w.clone(),
                    format: *f,
                })
            })
            .collect();
        let total_units = units.len();

        let semaphore = Arc::new(Semaphore::new(self.max_unit_parallel));
        let mut tasks = JoinSet::new();

        for unit in units {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|_| WorkerError::job_failed("Unit semaphore closed"))?;

            let blobs = Arc::clone(&self.blobs);
            let media = Arc::clone(&self.media);
            let clips = Arc::clone(&self.clips);
            let segments = Arc::clone(&segments);
            let source = source.clone();
            let scratch = workdir.path().to_path_buf();
            let job_id = job.id.clone();
            let user_id = job.user_id.clone();

            tasks.spawn(async move {
                let _permit = permit;
                let label = format!(
                    "clip {:.0}s-{:.0}s {}",
                    unit.window.start, unit.window.end, unit.format
                );
                produce_clip(
                    blobs, media, clips, &segments, &source, &scratch, job_id, &user_id, &unit,
                )
                .await
                .map_err(|e| format!("{label}: {e}"))
            });
        }

        let mut done = 0usize;
        let mut produced = 0u64;
        while let Some(joined) = tasks.join_next().await {
            let result =
                joined.map_err(|e| WorkerError::job_failed(format!("Unit task panicked: {e}")))?;
            match result {
                Ok(()) => produced += 1,
                Err(description) => {
                    warn!(job_id = %job.id, "{description}");
                    job.record_unit_failure(description);
                }
            }
            done += 1;
            let progress = 40 + ((done * 50) / total_units) as u8;
            job.set_progress(progress);
            self.jobs.save(job).await?;
        }

        if produced == 0 {
            return Err(WorkerError::unit_failed(format!(
                "All {} clip units failed: {}",
                total_units,
                job.unit_failures
                    .first()
                    .map(String::as_str)
                    .unwrap_or("no failure recorded")
            )));
        }

        workdir.remove().await?;
        Ok(produced)
    }
}

/// Produce one clip: cut, caption, upload, persist.
#[allow(clippy::too_many_arguments)]
async fn produce_clip(
    blobs: Arc<dyn BlobStore>,
    media: Arc<dyn MediaEngine>,
    clips: Arc<dyn ClipStore>,
    segments: &[TranscriptSegment],
    source: &std::path::Path,
    scratch: &std::path::Path,
    job_id: cliplyx_models::JobId,
    user_id: &str,
    unit: &ClipUnit,
) -> WorkerResult<()> {
    let window = &unit.window;
    let format = unit.format;

    let local = scratch.join(format!(
        "clip-{}-{}.mp4",
        window.start as u64,
        format.as_str()
    ));
    media
        .cut_clip(source, &local, window.start, window.end, format)
        .await?;

    let kept = filter_window_segments(segments, window);
    let srt = render_srt(kept.iter().copied());
    let transcription = kept
        .iter()
        .map(|s| s.text.trim())
        .collect::<Vec<_>>()
        .join(" ");

    let media_key = clip_key(user_id, job_id.as_str(), window.start, format);
    let subs_key = captions_key(user_id, job_id.as_str(), window.start, format);

    blobs.upload_clip(&local, &media_key).await?;
    blobs.upload_captions(&srt, &subs_key).await?;

    let size_bytes = tokio::fs::metadata(&local).await?.len();
    let record = ClipRecord::new(
        job_id,
        format,
        window.start,
        window.end,
        size_bytes,
        media_key,
        subs_key,
        transcription,
    );
    clips.create(&record).await?;

    Ok(())
}
