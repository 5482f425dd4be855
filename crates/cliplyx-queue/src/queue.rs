//! Job queue using Redis Streams.

use std::time::Duration;

use redis::AsyncCommands;
use tracing::{debug, info, warn};

use crate::error::{QueueError, QueueResult};
use crate::job::ProcessVideoJob;

/// Re-delivery delay before the given retry attempt (1-based).
///
/// Pure function of the attempt number: base 5s doubling per attempt, so
/// attempt 1 is redelivered after 5s, attempt 2 after 10s, attempt 3 after
/// 20s. The queue enforces this by refusing to re-claim a failed message
/// before its delay has elapsed.
pub fn retry_backoff(attempt: u32) -> Duration {
    let base = Duration::from_secs(5);
    base.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
}

/// Whether a pending message may be claimed for redelivery.
///
/// A message that already failed an attempt waits only for its retry-after
/// gate; the idle threshold applies to messages that never failed, i.e.
/// jobs orphaned by a crashed consumer that may still be running elsewhere.
pub fn eligible_for_claim(
    failed_before: bool,
    gated: bool,
    idle_ms: u64,
    min_idle_ms: u64,
) -> bool {
    !gated && (failed_before || idle_ms >= min_idle_ms)
}

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Redis URL
    pub redis_url: String,
    /// Stream name for jobs
    pub stream_name: String,
    /// Consumer group name
    pub consumer_group: String,
    /// Dead letter queue stream name
    pub dlq_stream_name: String,
    /// Max delivery attempts before DLQ
    pub max_attempts: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            stream_name: "cliplyx:jobs".to_string(),
            consumer_group: "cliplyx:workers".to_string(),
            dlq_stream_name: "cliplyx:dlq".to_string(),
            max_attempts: 3,
        }
    }
}

impl QueueConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            stream_name: std::env::var("QUEUE_STREAM")
                .unwrap_or_else(|_| "cliplyx:jobs".to_string()),
            consumer_group: std::env::var("QUEUE_CONSUMER_GROUP")
                .unwrap_or_else(|_| "cliplyx:workers".to_string()),
            dlq_stream_name: std::env::var("QUEUE_DLQ_STREAM")
                .unwrap_or_else(|_| "cliplyx:dlq".to_string()),
            max_attempts: std::env::var("QUEUE_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
        }
    }
}

/// Job queue client.
pub struct JobQueue {
    client: redis::Client,
    config: QueueConfig,
}

impl JobQueue {
    /// Create a new job queue.
    pub fn new(config: QueueConfig) -> QueueResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> QueueResult<Self> {
        Self::new(QueueConfig::from_env())
    }

    /// Initialize the queue (create consumer group if not exists).
    pub async fn init(&self) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let result: Result<(), redis::RedisError> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg("$")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;

        match result {
            Ok(_) => info!("Created consumer group: {}", self.config.consumer_group),
            Err(e) if e.to_string().contains("BUSYGROUP") => {
                debug!("Consumer group already exists: {}", self.config.consumer_group);
            }
            Err(e) => return Err(QueueError::Redis(e)),
        }

        Ok(())
    }

    /// Enqueue a process video job.
    pub async fn enqueue(&self, job: &ProcessVideoJob) -> QueueResult<String> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let payload = serde_json::to_string(job)?;
        let idempotency_key = job.idempotency_key();

        // Reject duplicates of an in-flight job id
        let dedup_key = format!("cliplyx:dedup:{}", idempotency_key);
        let exists: bool = conn.exists(&dedup_key).await?;
        if exists {
            warn!("Duplicate job rejected: {}", idempotency_key);
            return Err(QueueError::enqueue_failed("Duplicate job"));
        }

        let message_id: String = redis::cmd("XADD")
            .arg(&self.config.stream_name)
            .arg("*")
            .arg("job")
            .arg(&payload)
            .arg("key")
            .arg(&idempotency_key)
            .query_async(&mut conn)
            .await?;

        // Dedup key expires after an hour
        conn.set_ex::<_, _, ()>(&dedup_key, "1", 3600).await?;

        info!("Enqueued job {} with message ID {}", job.job_id, message_id);

        Ok(message_id)
    }

    /// Acknowledge a job (mark as completed) and remove it from the stream.
    pub async fn ack(&self, message_id: &str) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        redis::cmd("XACK")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg(message_id)
            .query_async::<()>(&mut conn)
            .await?;

        redis::cmd("XDEL")
            .arg(&self.config.stream_name)
            .arg(message_id)
            .query_async::<()>(&mut conn)
            .await?;

        debug!("Acknowledged job: {}", message_id);
        Ok(())
    }

    /// Clear the dedup key so the same job id can be enqueued again.
    pub async fn clear_dedup(&self, job: &ProcessVideoJob) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let dedup_key = format!("cliplyx:dedup:{}", job.idempotency_key());
        conn.del::<_, ()>(&dedup_key).await?;
        Ok(())
    }

    /// Move a job to the dead letter queue.
    pub async fn dlq(
        &self,
        message_id: &str,
        job: &ProcessVideoJob,
        error: &str,
    ) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let payload = serde_json::to_string(job)?;

        redis::cmd("XADD")
            .arg(&self.config.dlq_stream_name)
            .arg("*")
            .arg("job")
            .arg(&payload)
            .arg("error")
            .arg(error)
            .arg("original_id")
            .arg(message_id)
            .query_async::<()>(&mut conn)
            .await?;

        self.ack(message_id).await?;

        warn!("Moved job {} to DLQ: {}", job.job_id, error);
        Ok(())
    }

    /// Consume new jobs from the queue.
    /// Returns (message_id, job) pairs.
    pub async fn consume(
        &self,
        consumer_name: &str,
        block_ms: u64,
        count: usize,
    ) -> QueueResult<Vec<(String, ProcessVideoJob)>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let result: redis::streams::StreamReadReply = redis::cmd("XREADGROUP")
            .arg("GROUP")
            .arg(&self.config.consumer_group)
            .arg(consumer_name)
            .arg("COUNT")
            .arg(count)
            .arg("BLOCK")
            .arg(block_ms)
            .arg("STREAMS")
            .arg(&self.config.stream_name)
            .arg(">") // Only new messages
            .query_async(&mut conn)
            .await?;

        let mut jobs = Vec::new();

        for stream_key in result.keys {
            for entry in stream_key.ids {
                let message_id = entry.id.clone();

                if let Some(redis::Value::BulkString(payload)) = entry.map.get("job") {
                    let payload_str = String::from_utf8_lossy(payload);
                    match serde_json::from_str::<ProcessVideoJob>(&payload_str) {
                        Ok(job) => {
                            debug!("Consumed job {} from stream", job.job_id);
                            jobs.push((message_id, job));
                        }
                        Err(e) => {
                            warn!("Failed to parse job payload: {}", e);
                            // Ack the malformed message to prevent reprocessing
                            self.ack(&message_id).await.ok();
                        }
                    }
                }
            }
        }

        Ok(jobs)
    }

    /// Claim pending jobs whose re-delivery backoff has elapsed.
    ///
    /// Failed and crashed jobs sit in the pending entries list. A message
    /// with a recorded failed attempt is redelivered as soon as its
    /// retry-after gate expires; the minimum idle threshold only applies to
    /// orphaned messages, so a job still running on another consumer is not
    /// stolen mid-flight.
    pub async fn claim_pending(
        &self,
        consumer_name: &str,
        min_idle_ms: u64,
        count: usize,
    ) -> QueueResult<Vec<(String, ProcessVideoJob)>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let pending: redis::streams::StreamPendingCountReply = redis::cmd("XPENDING")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg("-")
            .arg("+")
            .arg(count)
            .query_async(&mut conn)
            .await?;

        let mut ready = Vec::new();

        for entry in pending.ids {
            let retry_after_key = format!("cliplyx:retry_after:{}", entry.id);
            let gated: bool = conn.exists(&retry_after_key).await?;

            let attempts_key = format!("cliplyx:attempts:{}", entry.id);
            let failed_before: bool = conn.exists(&attempts_key).await?;

            if eligible_for_claim(failed_before, gated, entry.last_delivered_ms as u64, min_idle_ms)
            {
                ready.push(entry.id);
            } else {
                debug!("Message {} not yet claimable, skipping", entry.id);
            }
        }

        if ready.is_empty() {
            return Ok(Vec::new());
        }

        let mut cmd = redis::cmd("XCLAIM");
        cmd.arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg(consumer_name)
            .arg(0u64);
        for id in &ready {
            cmd.arg(id);
        }

        let result: redis::streams::StreamClaimReply = cmd.query_async(&mut conn).await?;

        let mut jobs = Vec::new();

        for entry in result.ids {
            let message_id = entry.id.clone();

            if let Some(redis::Value::BulkString(payload)) = entry.map.get("job") {
                let payload_str = String::from_utf8_lossy(payload);
                match serde_json::from_str::<ProcessVideoJob>(&payload_str) {
                    Ok(job) => {
                        info!("Claimed pending job {} from stream", job.job_id);
                        jobs.push((message_id, job));
                    }
                    Err(e) => {
                        warn!("Failed to parse claimed job payload: {}", e);
                        self.ack(&message_id).await.ok();
                    }
                }
            }
        }

        Ok(jobs)
    }

    /// Record a failed attempt: increment the attempt counter and arm the
    /// re-delivery backoff gate. Returns the new attempt count.
    pub async fn record_failed_attempt(&self, message_id: &str) -> QueueResult<u32> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let key = format!("cliplyx:attempts:{}", message_id);
        let attempts: u32 = conn.incr(&key, 1).await?;
        conn.expire::<_, ()>(&key, 86400).await?;

        let delay = retry_backoff(attempts);
        let retry_after_key = format!("cliplyx:retry_after:{}", message_id);
        conn.set_ex::<_, _, ()>(&retry_after_key, "1", delay.as_secs().max(1))
            .await?;

        Ok(attempts)
    }

    /// Get the attempt count for a message.
    pub async fn attempt_count(&self, message_id: &str) -> QueueResult<u32> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("cliplyx:attempts:{}", message_id);
        let count: Option<u32> = conn.get(&key).await?;
        Ok(count.unwrap_or(0))
    }

    /// Get queue length.
    pub async fn len(&self) -> QueueResult<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let len: u64 = conn.xlen(&self.config.stream_name).await?;
        Ok(len)
    }

    /// Max delivery attempts from config.
    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_backoff_doubles_from_base() {
        assert_eq!(retry_backoff(1), Duration::from_secs(5));
        assert_eq!(retry_backoff(2), Duration::from_secs(10));
        assert_eq!(retry_backoff(3), Duration::from_secs(20));
    }

    #[test]
    fn test_retry_backoff_saturates() {
        // Absurd attempt numbers must not panic.
        let _ = retry_backoff(u32::MAX);
    }

    #[test]
    fn test_failed_message_waits_only_for_backoff() {
        // Gate armed: never claimable, however long it has been idle.
        assert!(!eligible_for_claim(true, true, 500_000, 300_000));
        // Gate expired: claimable immediately, idle threshold does not apply.
        assert!(eligible_for_claim(true, false, 6_000, 300_000));
    }

    #[test]
    fn test_orphaned_message_needs_min_idle() {
        assert!(!eligible_for_claim(false, false, 10_000, 300_000));
        assert!(eligible_for_claim(false, false, 300_000, 300_000));
    }
}
