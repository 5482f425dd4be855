//! Object storage seam for the pipeline.

use std::path::Path;

use async_trait::async_trait;

use cliplyx_storage::StorageClient;

use crate::error::WorkerResult;

/// Blob storage operations the pipeline needs.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Download the source video to a local path.
    async fn download_source(&self, key: &str, dest: &Path) -> WorkerResult<()>;
    /// Upload an encoded clip from a local file.
    async fn upload_clip(&self, path: &Path, key: &str) -> WorkerResult<()>;
    /// Upload rendered captions.
    async fn upload_captions(&self, content: &str, key: &str) -> WorkerResult<()>;
}

/// S3/MinIO-backed blob store.
pub struct S3BlobStore {
    client: StorageClient,
}

impl S3BlobStore {
    pub fn new(client: StorageClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn download_source(&self, key: &str, dest: &Path) -> WorkerResult<()> {
        self.client.download_video(key, dest).await?;
        Ok(())
    }

    async fn upload_clip(&self, path: &Path, key: &str) -> WorkerResult<()> {
        self.client
            .upload_clip_file(path, key, "video/mp4")
            .await?;
        Ok(())
    }

    async fn upload_captions(&self, content: &str, key: &str) -> WorkerResult<()> {
        self.client
            .upload_clip_bytes(content.as_bytes().to_vec(), key, "application/x-subrip")
            .await?;
        Ok(())
    }
}
