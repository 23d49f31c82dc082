use crate::types::{AppError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// An uploaded document written to disk for the duration of one build.
///
/// The file is removed when the guard drops, whether the build succeeded,
/// failed or was cancelled.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
}

impl StagedFile {
    /// Write `bytes` to a uniquely named file under `dir`.
    pub async fn write(dir: &Path, extension: &str, bytes: &[u8]) -> Result<Self> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| AppError::Internal(format!("cannot create staging dir: {}", e)))?;

        let name = format!("{}.{}", uuid::Uuid::new_v4(), sanitize_extension(extension));
        // Guard first, so a partial write is cleaned up too
        let staged = Self {
            path: dir.join(name),
        };

        tokio::fs::write(&staged.path, bytes)
            .await
            .map_err(|e| AppError::Internal(format!("cannot stage upload: {}", e)))?;

        debug!(path = %staged.path.display(), bytes = bytes.len(), "Staged upload");
        Ok(staged)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        // Blocking unlink on purpose: Drop cannot await, and it may run
        // outside a runtime.
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed staged upload"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove staged upload"),
        }
    }
}

fn sanitize_extension(extension: &str) -> String {
    let ext = extension.trim_start_matches('.');
    if !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        ext.to_ascii_lowercase()
    } else {
        "bin".to_string()
    }
}
