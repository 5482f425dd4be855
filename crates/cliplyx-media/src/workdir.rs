//! Job-scoped scratch directories.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::MediaResult;

/// A job-scoped working directory, removed on every exit path.
///
/// Each in-flight job owns exactly one of these, namespaced by job id, so
/// concurrent jobs never share scratch space. Dropping the guard removes the
/// directory even when the job fails partway; call [`WorkDir::remove`] on
/// the success path to surface removal errors instead of swallowing them.
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
    removed: bool,
}

impl WorkDir {
    /// Create the working directory for a job under the given root.
    pub async fn create(root: impl AsRef<Path>, job_id: &str) -> MediaResult<Self> {
        let path = root.as_ref().join(job_id);
        tokio::fs::create_dir_all(&path).await?;
        debug!("Created work dir {}", path.display());
        Ok(Self {
            path,
            removed: false,
        })
    }

    /// Path of the directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of a file inside the directory.
    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.path.join(name)
    }

    /// Remove the directory and its contents.
    pub async fn remove(mut self) -> MediaResult<()> {
        tokio::fs::remove_dir_all(&self.path).await?;
        self.removed = true;
        debug!("Removed work dir {}", self.path.display());
        Ok(())
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if !self.removed && self.path.exists() {
            if let Err(e) = std::fs::remove_dir_all(&self.path) {
                warn!("Failed to remove work dir {}: {}", self.path.display(), e);
            }
        }
    }
}
