//! Worker configuration.

use std::time::Duration;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum concurrent jobs
    pub max_concurrent_jobs: usize,
    /// Maximum clip renders in parallel within a single job
    pub max_unit_parallel: usize,
    /// Intake rate limit: jobs accepted per window
    pub intake_limit: u32,
    /// Intake rate limit window
    pub intake_window: Duration,
    /// Graceful shutdown timeout
    pub shutdown_timeout: Duration,
    /// Work directory for temporary files
    pub work_dir: String,
    /// How often the worker should scan pending jobs for redelivery
    pub claim_interval: Duration,
    /// Minimum idle time before an orphaned pending job can be claimed
    /// (crash recovery). Jobs with a recorded failed attempt ignore this and
    /// are redelivered once their backoff elapses.
    pub claim_min_idle: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 2,
            max_unit_parallel: 2,
            intake_limit: 10,
            intake_window: Duration::from_secs(60),
            shutdown_timeout: Duration::from_secs(30),
            work_dir: "/tmp/cliplyx".to_string(),
            claim_interval: Duration::from_secs(30),
            claim_min_idle: Duration::from_secs(300),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            max_concurrent_jobs: std::env::var("WORKER_MAX_JOBS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            max_unit_parallel: std::env::var("WORKER_MAX_UNIT_PARALLEL")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            intake_limit: std::env::var("WORKER_INTAKE_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            intake_window: Duration::from_secs(
                std::env::var("WORKER_INTAKE_WINDOW_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            shutdown_timeout: Duration::from_secs(
                std::env::var("WORKER_SHUTDOWN_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            work_dir: std::env::var("WORKER_WORK_DIR")
                .unwrap_or_else(|_| "/tmp/cliplyx".to_string()),
            claim_interval: Duration::from_secs(
                std::env::var("WORKER_CLAIM_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            claim_min_idle: Duration::from_secs(
                std::env::var("WORKER_CLAIM_MIN_IDLE_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
        }
    }
}
