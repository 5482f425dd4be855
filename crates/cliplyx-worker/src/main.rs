//! Clip production worker binary.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cliplyx_queue::JobQueue;
use cliplyx_storage::StorageClient;
use cliplyx_worker::{
    FfmpegEngine, JobExecutor, Pipeline, RedisStore, S3BlobStore, WhisperClient, WorkerConfig,
};

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::from_default_env().add_directive("cliplyx=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting cliplyx-worker");

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let queue = match JobQueue::from_env() {
        Ok(q) => q,
        Err(e) => {
            error!("Failed to create job queue: {}", e);
            std::process::exit(1);
        }
    };

    let store = match RedisStore::from_env() {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!("Failed to create job store: {}", e);
            std::process::exit(1);
        }
    };

    let storage = match StorageClient::from_env() {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create storage client: {}", e);
            std::process::exit(1);
        }
    };

    let whisper = match WhisperClient::from_env() {
        Ok(w) => Arc::new(w),
        Err(e) => {
            error!("Failed to create Whisper client: {}", e);
            std::process::exit(1);
        }
    };

    let pipeline = Pipeline::new(
        store.clone(),
        store,
        Arc::new(S3BlobStore::new(storage)),
        Arc::new(FfmpegEngine),
        whisper,
        config.work_dir.clone(),
        config.max_unit_parallel,
    );

    let executor = match JobExecutor::new(config, queue, pipeline) {
        Ok(e) => e,
        Err(e) => {
            error!("Failed to create job executor: {}", e);
            std::process::exit(1);
        }
    };

    // Setup signal handlers
    let shutdown_handle = tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
    });

    // Run executor
    if let Err(e) = executor.run().await {
        error!("Executor error: {}", e);
        std::process::exit(1);
    }

    // Wait for shutdown
    shutdown_handle.await.ok();

    info!("Worker shutdown complete");
}
