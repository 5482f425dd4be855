//! Job executor.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use cliplyx_queue::{JobQueue, ProcessVideoJob};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::pipeline::Pipeline;

/// Intake rate limiter type alias.
type IntakeLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Job executor that processes jobs from the queue.
pub struct JobExecutor {
    config: WorkerConfig,
    queue: Arc<JobQueue>,
    pipeline: Arc<Pipeline>,
    job_semaphore: Arc<Semaphore>,
    intake_limiter: Arc<IntakeLimiter>,
    shutdown: tokio::sync::watch::Sender<bool>,
    consumer_name: String,
}

impl JobExecutor {
    /// Create a new job executor.
    pub fn new(config: WorkerConfig, queue: JobQueue, pipeline: Pipeline) -> WorkerResult<Self> {
        let job_semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs));
        let (shutdown, _) = tokio::sync::watch::channel(false);
        let consumer_name = format!("worker-{}", Uuid::new_v4());

        let limit = NonZeroU32::new(config.intake_limit)
            .ok_or_else(|| WorkerError::config_error("Intake limit must be non-zero"))?;
        let period = config.intake_window / config.intake_limit;
        let quota = Quota::with_period(period)
            .ok_or_else(|| WorkerError::config_error("Intake window must be non-zero"))?
            .allow_burst(limit);
        let intake_limiter = Arc::new(RateLimiter::direct(quota));

        Ok(Self {
            config,
            queue: Arc::new(queue),
            pipeline: Arc::new(pipeline),
            job_semaphore,
            intake_limiter,
            shutdown,
            consumer_name,
        })
    }

    /// Start the executor.
    pub async fn run(&self) -> WorkerResult<()> {
        info!(
            "Starting job executor '{}' with {} max concurrent jobs",
            self.consumer_name, self.config.max_concurrent_jobs
        );

        self.queue.init().await?;

        let mut shutdown_rx = self.shutdown.subscribe();

        // Periodically reclaim jobs orphaned by crashed workers or armed
        // for redelivery after a failed attempt
        let queue_clone = Arc::clone(&self.queue);
        let pipeline_clone = Arc::clone(&self.pipeline);
        let limiter_clone = Arc::clone(&self.intake_limiter);
        let consumer_name = self.consumer_name.clone();
        let semaphore_clone = Arc::clone(&self.job_semaphore);
        let claim_interval = self.config.claim_interval;
        let claim_min_idle = self.config.claim_min_idle;
        let mut shutdown_rx_claim = self.shutdown.subscribe();

        let claim_task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(claim_interval);
            loop {
                tokio::select! {
                    _ = shutdown_rx_claim.changed() => {
                        if *shutdown_rx_claim.borrow() {
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        let min_idle_ms = claim_min_idle.as_millis() as u64;
                        match queue_clone.claim_pending(&consumer_name, min_idle_ms, 5).await {
                            Ok(jobs) if !jobs.is_empty() => {
                                info!("Claimed {} pending jobs", jobs.len());
                                for (message_id, job) in jobs {
                                    let pipeline = Arc::clone(&pipeline_clone);
                                    let queue = Arc::clone(&queue_clone);
                                    let limiter = Arc::clone(&limiter_clone);
                                    let permit = match semaphore_clone.clone().acquire_owned().await {
                                        Ok(p) => p,
                                        Err(_) => break,
                                    };

                                    tokio::spawn(async move {
                                        let _permit = permit;
                                        limiter.until_ready().await;
                                        Self::execute_job(pipeline, queue, message_id, job).await;
                                    });
                                }
                            }
                            Ok(_) => {}
                            Err(e) => {
                                warn!("Failed to claim pending jobs: {}", e);
                            }
                        }
                    }
                }
            }
        });

        // Main job consumption loop
        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping executor");
                        break;
                    }
                }
                result = self.consume_jobs() => {
                    if let Err(e) = result {
                        error!("Error consuming jobs: {}", e);
                        // Back off on error
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        }

        claim_task.abort();

        info!("Waiting for in-flight jobs to complete...");
        let _ = tokio::time::timeout(self.config.shutdown_timeout, self.wait_for_jobs()).await;

        info!("Job executor stopped");
        Ok(())
    }

    /// Consume and process jobs from the queue.
    async fn consume_jobs(&self) -> WorkerResult<()> {
        let available = self.job_semaphore.available_permits();
        if available == 0 {
            // All slots busy, wait a bit
            tokio::time::sleep(Duration::from_millis(100)).await;
            return Ok(());
        }

        let jobs = self
            .queue
            .consume(&self.consumer_name, 1000, available.min(5))
            .await?;

        if jobs.is_empty() {
            return Ok(());
        }

        debug!("Consumed {} jobs from queue", jobs.len());

        for (message_id, job) in jobs {
            let pipeline = Arc::clone(&self.pipeline);
            let queue = Arc::clone(&self.queue);
            let limiter = Arc::clone(&self.intake_limiter);
            let permit = self
                .job_semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| WorkerError::job_failed("Semaphore closed"))?;

            tokio::spawn(async move {
                let _permit = permit;
                limiter.until_ready().await;
                Self::execute_job(pipeline, queue, message_id, job).await;
            });
        }

        Ok(())
    }

    /// Execute a single job with retry and DLQ handling.
    async fn execute_job(
        pipeline: Arc<Pipeline>,
        queue: Arc<JobQueue>,
        message_id: String,
        job: ProcessVideoJob,
    ) {
        let job_id = job.job_id.to_string();
        info!("Executing job {}", job_id);

        match pipeline.process(&job).await {
            Ok(()) => {
                if let Err(e) = queue.ack(&message_id).await {
                    error!("Failed to ack job {}: {}", job_id, e);
                }
                if let Err(e) = queue.clear_dedup(&job).await {
                    warn!("Failed to clear dedup key for job {}: {}", job_id, e);
                }
            }
            Err(e) => {
                error!("Job {} failed: {}", job_id, e);

                if e.is_permanent_failure() {
                    warn!("Job {} is unprocessable, moving to DLQ", job_id);
                    Self::bury(&queue, &message_id, &job, &e).await;
                    return;
                }

                let attempts = queue.record_failed_attempt(&message_id).await.unwrap_or(999);
                let max_attempts = queue.max_attempts();

                if attempts >= max_attempts {
                    warn!(
                        "Job {} exceeded max attempts ({}), moving to DLQ",
                        job_id, max_attempts
                    );
                    Self::bury(&queue, &message_id, &job, &e).await;
                } else {
                    info!(
                        "Job {} will be redelivered (attempt {}/{})",
                        job_id, attempts, max_attempts
                    );
                    // The claim loop redelivers once the backoff gate expires
                }
            }
        }
    }

    async fn bury(queue: &JobQueue, message_id: &str, job: &ProcessVideoJob, error: &WorkerError) {
        if let Err(dlq_err) = queue.dlq(message_id, job, &error.to_string()).await {
            error!("Failed to move job {} to DLQ: {}", job.job_id, dlq_err);
        }
        // Allow the job id to be enqueued again manually
        if let Err(e) = queue.clear_dedup(job).await {
            warn!("Failed to clear dedup key for job {}: {}", job.job_id, e);
        }
    }

    /// Wait for all in-flight jobs to complete.
    async fn wait_for_jobs(&self) {
        loop {
            let available = self.job_semaphore.available_permits();
            if available == self.config.max_concurrent_jobs {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    /// Signal shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}
