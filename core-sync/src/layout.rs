//! On-disk layout of one synced collection.
//!
//! For an output root `R` and collection id `C`:
//!
//! ```text
//! R/
//!   <Title> - C.m3u            playback manifest
//!   .playsync/
//!     C/                       media files: "NN) Title - ID.ext"
//!     C.json                   side-file: last-seen collection title/id
//!     old/C/                   archived files, original names preserved
//! ```
//!
//! Manifest entry paths are relative to `R`, so the whole root stays
//! relocatable.

use crate::error::{Result, SyncError};
use crate::item::CollectionSnapshot;
use crate::naming::sanitize_title;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the hidden data directory under the output root.
const DATA_DIR: &str = ".playsync";

/// Path derivations for one collection under one output root.
#[derive(Debug, Clone)]
pub struct CollectionLayout {
    root: PathBuf,
    collection_id: String,
}

impl CollectionLayout {
    pub fn new(root: impl Into<PathBuf>, collection_id: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            collection_id: collection_id.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn collection_id(&self) -> &str {
        &self.collection_id
    }

    /// Directory holding the collection's media files.
    pub fn media_dir(&self) -> PathBuf {
        self.root.join(DATA_DIR).join(&self.collection_id)
    }

    /// Old area receiving archived files for this collection.
    pub fn old_dir(&self) -> PathBuf {
        self.root
            .join(DATA_DIR)
            .join("old")
            .join(&self.collection_id)
    }

    /// Side-file recording the last-seen collection title/id.
    pub fn side_file(&self) -> PathBuf {
        self.root
            .join(DATA_DIR)
            .join(format!("{}.json", self.collection_id))
    }

    /// Manifest path for the given (unsanitized) collection title.
    pub fn manifest_path(&self, title: &str) -> PathBuf {
        self.root
            .join(format!("{} - {}.m3u", sanitize_title(title), self.collection_id))
    }

    /// Manifest-entry path for a media file, relative to the output root.
    pub fn manifest_relative(&self, file_name: &str) -> String {
        format!("./{}/{}/{}", DATA_DIR, self.collection_id, file_name)
    }

    /// Whether a filename in the root is a manifest for this collection.
    pub fn is_manifest_name(&self, file_name: &str) -> bool {
        file_name.ends_with(".m3u") && file_name.contains(&self.collection_id)
    }

    /// Create the media and old directories. Must run before any write
    /// phase; an unwritable root is fatal to the whole run.
    pub async fn ensure_dirs(&self) -> Result<()> {
        for dir in [self.media_dir(), self.old_dir()] {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| SyncError::Scan {
                    path: dir.clone(),
                    source: e,
                })?;
        }
        Ok(())
    }
}

/// Last-seen collection metadata, persisted next to the media directory.
///
/// Read back by the presence reporter to label what is playing; the sync
/// engine itself only writes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub id: String,
    pub title: String,
    pub last_synced_at: DateTime<Utc>,
}

impl CollectionInfo {
    pub fn from_snapshot(snapshot: &CollectionSnapshot) -> Self {
        Self {
            id: snapshot.id.clone(),
            title: snapshot.title.clone(),
            last_synced_at: Utc::now(),
        }
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SyncError::Config(format!("side-file serialization: {e}")))?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| SyncError::Scan {
                path: path.to_path_buf(),
                source: e,
            })?;
        debug!(path = %path.display(), "wrote collection side-file");
        Ok(())
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SyncError::Scan {
                path: path.to_path_buf(),
                source: e,
            })?;
        serde_json::from_str(&json)
            .map_err(|e| SyncError::Config(format!("side-file parse: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_rooted_under_the_data_dir() {
        let layout = CollectionLayout::new("/music", "PL123");
        assert_eq!(layout.media_dir(), PathBuf::from("/music/.playsync/PL123"));
        assert_eq!(
            layout.old_dir(),
            PathBuf::from("/music/.playsync/old/PL123")
        );
        assert_eq!(
            layout.side_file(),
            PathBuf::from("/music/.playsync/PL123.json")
        );
    }

    #[test]
    fn manifest_path_sanitizes_the_title() {
        let layout = CollectionLayout::new("/music", "PL123");
        assert_eq!(
            layout.manifest_path("My/Mix"),
            PathBuf::from("/music/My-Mix - PL123.m3u")
        );
    }

    #[test]
    fn manifest_relative_points_into_the_data_dir() {
        let layout = CollectionLayout::new("/music", "PL123");
        assert_eq!(
            layout.manifest_relative("01) A - aaaaaaaaaaa.mp3"),
            "./.playsync/PL123/01) A - aaaaaaaaaaa.mp3"
        );
    }

    #[test]
    fn manifest_name_detection_matches_collection_id_only() {
        let layout = CollectionLayout::new("/music", "PL123");
        assert!(layout.is_manifest_name("Old Title - PL123.m3u"));
        assert!(!layout.is_manifest_name("Other - PL999.m3u"));
        assert!(!layout.is_manifest_name("PL123.txt"));
    }
}
