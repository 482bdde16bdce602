//! Player discovery and now-playing detection.
//!
//! Walks the process table for known players, then inspects each candidate's
//! open files for a synced media file (recognized by the id token in its
//! filename). Metadata comes from the file's embedded tags plus the
//! collection side-file next to the media directory.

use crate::players::{lookup_player, PlayerInfo};
use core_sync::layout::CollectionInfo;
use core_sync::naming::parse_position_hint;
use core_sync::scanner::extract_id;
use core_sync::ItemId;
use core_tags::LoftyTagReader;
use std::path::{Path, PathBuf};
use sysinfo::System;
use tracing::{debug, trace};

/// Extensions the sync engine produces.
const MEDIA_EXTENSIONS: &[&str] = &["mp3", "mp4"];

/// A synced track currently open in a known player.
#[derive(Debug, Clone)]
pub struct NowPlaying {
    pub item_id: ItemId,
    pub title: String,
    pub author: String,
    /// Position within the collection, when the filename encodes one
    pub position: Option<u32>,
    pub player: &'static PlayerInfo,
    /// Side-file of the owning collection, when present
    pub collection: Option<CollectionInfo>,
}

/// Scans the process table for a known player playing a synced file.
pub struct PlayerWatcher {
    system: System,
    tags: LoftyTagReader,
}

impl PlayerWatcher {
    pub fn new() -> Self {
        Self {
            system: System::new_all(),
            tags: LoftyTagReader::new(),
        }
    }

    /// One scan pass. Returns the first synced track found open in a known
    /// player, or `None` when nothing relevant is playing.
    pub async fn scan(&mut self) -> Option<NowPlaying> {
        self.system.refresh_processes();

        for (pid, process) in self.system.processes() {
            let Some(player) = lookup_player(process.name()) else {
                continue;
            };
            trace!(pid = pid.as_u32(), player = player.name, "known player found");

            for path in open_media_files(pid.as_u32()) {
                if let Some(now) = self.inspect(&path, player).await {
                    return Some(now);
                }
            }
        }
        None
    }

    async fn inspect(&self, path: &Path, player: &'static PlayerInfo) -> Option<NowPlaying> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        if !MEDIA_EXTENSIONS.contains(&extension.as_str()) {
            return None;
        }
        let stem = path.file_stem()?.to_string_lossy();
        let item_id = extract_id(&stem)?;

        let tags = self.tags.read_tags(path).await.ok();
        let title = tags
            .as_ref()
            .and_then(|t| t.title.clone())
            .unwrap_or_else(|| stem.to_string());
        let author = tags
            .as_ref()
            .and_then(|t| t.artist.clone())
            .unwrap_or_else(|| "Unknown".to_string());

        let collection = match side_file_for(path) {
            Some(side) => CollectionInfo::load(&side).await.ok(),
            None => None,
        };

        debug!(item = %item_id, title = %title, player = player.name, "now playing");
        Some(NowPlaying {
            item_id,
            title,
            author,
            position: parse_position_hint(&stem),
            player,
            collection,
        })
    }
}

impl Default for PlayerWatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Side-file location for a media file: the media directory is named after
/// the collection id, and the side-file sits next to it as `<id>.json`.
fn side_file_for(media_path: &Path) -> Option<PathBuf> {
    let collection_dir = media_path.parent()?;
    let collection_id = collection_dir.file_name()?.to_str()?;
    let side = collection_dir
        .parent()?
        .join(format!("{collection_id}.json"));
    side.is_file().then_some(side)
}

/// Files a process currently holds open, filtered to regular paths.
#[cfg(target_os = "linux")]
fn open_media_files(pid: u32) -> Vec<PathBuf> {
    let fd_dir = PathBuf::from(format!("/proc/{pid}/fd"));
    let Ok(entries) = std::fs::read_dir(&fd_dir) else {
        return Vec::new();
    };
    entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| std::fs::read_link(entry.path()).ok())
        .filter(|target| target.is_absolute() && target.extension().is_some())
        .collect()
}

#[cfg(not(target_os = "linux"))]
fn open_media_files(_pid: u32) -> Vec<PathBuf> {
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_file_sits_next_to_the_collection_directory() {
        let dir = tempfile::tempdir().unwrap();
        let media_dir = dir.path().join(".playsync/PLtest");
        std::fs::create_dir_all(&media_dir).unwrap();
        let media = media_dir.join("01) A - aaaaaaaaaaa.mp3");
        std::fs::write(&media, b"x").unwrap();

        // No side-file yet.
        assert_eq!(side_file_for(&media), None);

        let side = dir.path().join(".playsync/PLtest.json");
        std::fs::write(&side, b"{}").unwrap();
        assert_eq!(side_file_for(&media), Some(side));
    }
}
