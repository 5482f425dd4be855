//! Job and clip persistence.
//!
//! The pipeline talks to stores through traits so tests can swap in
//! in-memory fakes. The production implementation keeps job records and
//! clip lists as JSON in Redis.

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::debug;

use cliplyx_models::{ClipRecord, JobId, JobRecord};

use crate::error::WorkerResult;

/// Persistence for job records.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn load(&self, job_id: &JobId) -> WorkerResult<Option<JobRecord>>;
    async fn save(&self, job: &JobRecord) -> WorkerResult<()>;
}

/// Persistence for produced clips.
#[async_trait]
pub trait ClipStore: Send + Sync {
    async fn create(&self, clip: &ClipRecord) -> WorkerResult<()>;
    async fn list_for_job(&self, job_id: &JobId) -> WorkerResult<Vec<ClipRecord>>;
}

/// Redis-backed job and clip store.
///
/// Jobs live at `cliplyx:job:{id}` as a JSON blob; clips are appended to
/// the `cliplyx:clips:{job_id}` list in creation order.
pub struct RedisStore {
    client: redis::Client,
}

impl RedisStore {
    pub fn new(redis_url: &str) -> WorkerResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    pub fn from_env() -> WorkerResult<Self> {
        let url = std::env::var("REDIS_URL")
            .unwrap_or_else(|_| "redis://localhost:6379".to_string());
        Self::new(&url)
    }

    fn job_key(job_id: &JobId) -> String {
        format!("cliplyx:job:{}", job_id)
    }

    fn clips_key(job_id: &JobId) -> String {
        format!("cliplyx:clips:{}", job_id)
    }
}

#[async_trait]
impl JobStore for RedisStore {
    async fn load(&self, job_id: &JobId) -> WorkerResult<Option<JobRecord>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(Self::job_key(job_id)).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, job: &JobRecord) -> WorkerResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let json = serde_json::to_string(job)?;
        conn.set::<_, _, ()>(Self::job_key(&job.id), json).await?;
        debug!(job_id = %job.id, status = job.status.as_str(), progress = job.progress, "Saved job record");
        Ok(())
    }
}

#[async_trait]
impl ClipStore for RedisStore {
    async fn create(&self, clip: &ClipRecord) -> WorkerResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let json = serde_json::to_string(clip)?;
        conn.rpush::<_, _, ()>(Self::clips_key(&clip.job_id), json)
            .await?;
        debug!(job_id = %clip.job_id, key = %clip.clip_key, "Recorded clip");
        Ok(())
    }

    async fn list_for_job(&self, job_id: &JobId) -> WorkerResult<Vec<ClipRecord>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Vec<String> = conn.lrange(Self::clips_key(job_id), 0, -1).await?;
        let mut clips = Vec::with_capacity(raw.len());
        for json in raw {
            clips.push(serde_json::from_str(&json)?);
        }
        Ok(clips)
    }
}
