//! S3-compatible object storage client.
//!
//! This crate provides:
//! - File upload/download against S3 or MinIO
//! - Existence checks and deletion
//! - The storage key layout for clip and caption artifacts

pub mod client;
pub mod error;
pub mod keys;

pub use client::{StorageClient, StorageConfig};
pub use error::{StorageError, StorageResult};
pub use keys::{captions_key, clip_key};
