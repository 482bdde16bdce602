//! # Archive Policy
//!
//! Items that fell out of the remote collection are moved into the
//! collection's old area, never deleted. Original filenames are preserved so
//! an archived file can be restored (or re-adopted by a later run) by hand.

use crate::error::{Result, SyncError};
use crate::scanner::LocalEntry;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Relocates archived entries into one collection's old area.
pub struct ArchivePolicy {
    old_dir: PathBuf,
}

impl ArchivePolicy {
    pub fn new(old_dir: impl Into<PathBuf>) -> Self {
        Self {
            old_dir: old_dir.into(),
        }
    }

    pub fn old_dir(&self) -> &Path {
        &self.old_dir
    }

    /// Move one entry into the old area under its original filename.
    ///
    /// A same-named file already in the old area is overwritten
    /// (last-write-wins, logged, never silent). Failures are reported to the
    /// caller, which treats them as non-fatal and leaves the file where it
    /// is.
    pub async fn archive(&self, entry: &LocalEntry) -> Result<PathBuf> {
        let file_name = entry.file_name();
        let destination = self.old_dir.join(&file_name);

        if tokio::fs::try_exists(&destination).await.unwrap_or(false) {
            warn!(
                item = %entry.id,
                path = %destination.display(),
                "old area already holds this name; overwriting"
            );
        }

        move_file(&entry.path, &destination)
            .await
            .map_err(|e| SyncError::ArchiveFailure {
                path: entry.path.clone(),
                source: e,
            })?;

        info!(
            item = %entry.id,
            from = %entry.path.display(),
            to = %destination.display(),
            "archived"
        );
        Ok(destination)
    }
}

async fn move_file(src: &Path, dst: &Path) -> std::io::Result<()> {
    if tokio::fs::rename(src, dst).await.is_ok() {
        return Ok(());
    }
    tokio::fs::copy(src, dst).await?;
    tokio::fs::remove_file(src).await
}
