//! # Manifest Builder
//!
//! Accumulates playback entries as the plan executes and serializes them to
//! an M3U-style manifest once the execution phase fully drains.
//!
//! The accumulator is the only structure in a run written by multiple
//! workers, so it lives behind a lock; keys are collection positions, which
//! makes the final serialization order independent of completion order.
//! Failed or skipped items are simply absent, never blank placeholders.

use crate::error::{Result, SyncError};
use crate::layout::CollectionLayout;
use std::collections::BTreeMap;
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// One playback entry of the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Remote collection position; manifest sort key
    pub position: u32,
    /// Seconds, `-1` when unknown (M3U convention)
    pub duration_secs: i64,
    pub title: String,
    pub author: String,
    /// Path relative to the manifest's own directory
    pub relative_path: String,
}

impl ManifestEntry {
    fn render(&self) -> String {
        format!(
            "#EXTINF:{},{} - By: {}\n{}",
            self.duration_secs, self.title, self.author, self.relative_path
        )
    }
}

/// Position-keyed accumulator for one run's manifest.
#[derive(Debug, Default)]
pub struct ManifestBuilder {
    entries: Mutex<BTreeMap<u32, ManifestEntry>>,
}

impl ManifestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry. Positions are unique by the plan's partition
    /// invariant; a colliding insert replaces and is reported by the caller's
    /// logs, not silently duplicated in the output.
    pub async fn insert(&self, entry: ManifestEntry) {
        self.entries.lock().await.insert(entry.position, entry);
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Serialize all entries in ascending position order.
    pub async fn render(&self) -> String {
        let entries = self.entries.lock().await;
        let mut out = entries
            .values()
            .map(ManifestEntry::render)
            .collect::<Vec<_>>()
            .join("\n\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }

    /// Write the manifest file, replacing any previous one at `path`.
    pub async fn write_to(&self, path: &Path) -> Result<()> {
        let rendered = self.render().await;
        tokio::fs::write(path, rendered)
            .await
            .map_err(|e| SyncError::ManifestWrite {
                path: path.to_path_buf(),
                source: e,
            })?;
        info!(path = %path.display(), entries = self.len().await, "wrote manifest");
        Ok(())
    }
}

/// Remove manifests for this collection written under an older title.
///
/// A collection rename changes the manifest filename; the stale file would
/// otherwise keep shadowing the fresh one in players.
pub async fn remove_stale_manifests(layout: &CollectionLayout, current: &Path) -> Result<()> {
    let root = layout.root().to_path_buf();
    let mut entries = match tokio::fs::read_dir(&root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(SyncError::Scan {
                path: root,
                source: e,
            })
        }
    };

    while let Some(entry) = entries.next_entry().await.map_err(|e| SyncError::Scan {
        path: root.clone(),
        source: e,
    })? {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if path != current && layout.is_manifest_name(&name) {
            debug!(path = %path.display(), "removing stale manifest");
            if let Err(e) = tokio::fs::remove_file(&path).await {
                debug!(path = %path.display(), error = %e, "stale manifest removal failed");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(position: u32, title: &str, duration: i64) -> ManifestEntry {
        ManifestEntry {
            position,
            duration_secs: duration,
            title: title.to_string(),
            author: "Artist".to_string(),
            relative_path: format!("./.playsync/PL/{position:02}) {title} - xxxxxxxxxxx.mp3"),
        }
    }

    #[tokio::test]
    async fn renders_in_position_order_regardless_of_insertion_order() {
        let builder = ManifestBuilder::new();
        builder.insert(entry(3, "C", 30)).await;
        builder.insert(entry(1, "A", 10)).await;
        builder.insert(entry(2, "B", 20)).await;

        let rendered = builder.render().await;
        let lines: Vec<&str> = rendered.lines().collect();
        assert!(lines[0].starts_with("#EXTINF:10,A - By: Artist"));
        assert!(lines[3].starts_with("#EXTINF:20,B"));
        assert!(lines[6].starts_with("#EXTINF:30,C"));
    }

    #[tokio::test]
    async fn entries_are_blank_line_separated() {
        let builder = ManifestBuilder::new();
        builder.insert(entry(1, "A", 10)).await;
        builder.insert(entry(2, "B", 20)).await;

        let rendered = builder.render().await;
        assert_eq!(
            rendered,
            "#EXTINF:10,A - By: Artist\n\
             ./.playsync/PL/01) A - xxxxxxxxxxx.mp3\n\
             \n\
             #EXTINF:20,B - By: Artist\n\
             ./.playsync/PL/02) B - xxxxxxxxxxx.mp3\n"
        );
    }

    #[tokio::test]
    async fn missing_positions_leave_no_placeholder() {
        let builder = ManifestBuilder::new();
        builder.insert(entry(1, "A", 10)).await;
        // Position 2 failed to fetch: nothing was inserted.
        builder.insert(entry(3, "C", 30)).await;

        let rendered = builder.render().await;
        assert_eq!(rendered.matches("#EXTINF:").count(), 2);
        let positions: Vec<u32> = rendered
            .lines()
            .filter(|l| l.ends_with(".mp3"))
            .map(|l| l.split("/").last().unwrap()[..2].parse().unwrap())
            .collect();
        assert_eq!(positions, vec![1, 3]);
    }

    #[tokio::test]
    async fn unknown_duration_serializes_as_minus_one() {
        let builder = ManifestBuilder::new();
        builder.insert(entry(1, "A", -1)).await;
        assert!(builder.render().await.starts_with("#EXTINF:-1,A"));
    }

    #[tokio::test]
    async fn empty_builder_renders_empty_manifest() {
        let builder = ManifestBuilder::new();
        assert!(builder.is_empty().await);
        assert_eq!(builder.render().await, "");
    }

    #[tokio::test]
    async fn stale_manifests_for_the_collection_are_removed() {
        let root = tempfile::tempdir().unwrap();
        let layout = CollectionLayout::new(root.path(), "PLtest");

        let stale = root.path().join("Old Name - PLtest.m3u");
        let other = root.path().join("Unrelated - PLother.m3u");
        let current = layout.manifest_path("New Name");
        std::fs::write(&stale, "x").unwrap();
        std::fs::write(&other, "x").unwrap();
        std::fs::write(&current, "x").unwrap();

        remove_stale_manifests(&layout, &current).await.unwrap();

        assert!(!stale.exists());
        assert!(other.exists());
        assert!(current.exists());
    }
}
