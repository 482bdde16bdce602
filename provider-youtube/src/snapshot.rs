//! Flat-playlist snapshot extraction.

use crate::error::ProviderError;
use crate::playlist_url;
use crate::types::{PlaylistDump, PlaylistEntry};
use async_trait::async_trait;
use core_sync::error::SyncError;
use core_sync::item::{CollectionSnapshot, ItemDescriptor, ItemId, ItemStatus};
use core_sync::provider::SnapshotProvider;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Title sentinels yt-dlp reports for tombstoned entries.
const DELETED_TITLE: &str = "[Deleted video]";
const PRIVATE_TITLE: &str = "[Private video]";

/// Snapshot provider shelling out to `yt-dlp` in extraction-only mode.
pub struct YoutubeSnapshotProvider {
    binary: PathBuf,
    cookie_file: Option<PathBuf>,
}

impl YoutubeSnapshotProvider {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("yt-dlp"),
            cookie_file: None,
        }
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Cookie file granting access to private collections.
    pub fn with_cookie_file(mut self, path: Option<PathBuf>) -> Self {
        self.cookie_file = path;
        self
    }

    #[instrument(skip(self))]
    async fn dump_playlist(&self, collection_id: &str) -> Result<PlaylistDump, ProviderError> {
        let mut command = Command::new(&self.binary);
        command
            .arg("--flat-playlist")
            .arg("--dump-single-json")
            .arg("--skip-download")
            .arg("--no-warnings")
            .arg(playlist_url(collection_id))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cookies) = &self.cookie_file {
            command.arg("--cookies").arg(cookies);
        }

        let output = command.output().await.map_err(|e| ProviderError::Launch {
            binary: self.binary.display().to_string(),
            source: e,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProviderError::Extraction(
                stderr.lines().last().unwrap_or("unknown error").to_string(),
            ));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| ProviderError::InvalidOutput(e.to_string()))
    }
}

impl Default for YoutubeSnapshotProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotProvider for YoutubeSnapshotProvider {
    async fn snapshot(&self, collection_id: &str) -> core_sync::Result<CollectionSnapshot> {
        let dump = self.dump_playlist(collection_id).await.map_err(|e| {
            SyncError::AdapterUnavailable {
                collection: collection_id.to_string(),
                reason: e.to_string(),
            }
        })?;

        debug!(
            collection = %dump.id,
            title = %dump.title,
            entries = dump.entries.len(),
            "snapshot extracted"
        );

        let entries = dump
            .entries
            .iter()
            .enumerate()
            .map(|(index, entry)| convert_entry(index, entry))
            .collect();

        Ok(CollectionSnapshot {
            id: dump.id,
            title: dump.title,
            entries,
        })
    }
}

fn convert_entry(index: usize, entry: &PlaylistEntry) -> ItemDescriptor {
    let title = entry.title.clone().unwrap_or_default();
    let status = entry_status(&title, entry.live_status.as_deref());
    ItemDescriptor {
        id: ItemId::new(entry.id.as_str()),
        title,
        author: entry.uploader.clone(),
        duration_secs: entry.duration.map(|d| d.round() as u32),
        position: entry.playlist_index.unwrap_or(index as u32 + 1),
        status,
    }
}

fn entry_status(title: &str, live_status: Option<&str>) -> ItemStatus {
    match title {
        DELETED_TITLE => ItemStatus::Deleted,
        PRIVATE_TITLE => ItemStatus::Private,
        _ => match live_status {
            Some(status) if status != "not_live" => ItemStatus::Live,
            _ => ItemStatus::Normal,
        },
    }
}
