//! Audio tag reading via `lofty`.
//!
//! Implements the engine's [`TagReader`] seam for already-downloaded files.
//! Only the fields the manifest and presence layers actually display are
//! read: title, artist, and duration. Supports ID3v2, Vorbis Comments, MP4
//! tags, and FLAC through lofty's format probing.

use async_trait::async_trait;
use core_sync::error::{Result, SyncError};
use core_sync::provider::{TagReader, TrackTags};
use lofty::config::ParseOptions;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::Accessor;
use std::path::Path;
use tracing::debug;

/// Tag reader backed by `lofty`.
pub struct LoftyTagReader {
    parse_options: ParseOptions,
}

impl LoftyTagReader {
    pub fn new() -> Self {
        Self {
            parse_options: ParseOptions::new(),
        }
    }

    /// Read title/artist/duration from a local media file.
    ///
    /// Files with readable audio properties but no tags still succeed with
    /// empty text fields; the caller decides on fallbacks.
    pub async fn read_tags(&self, path: &Path) -> Result<TrackTags> {
        debug!(path = %path.display(), "reading tags");

        let data = tokio::fs::read(path).await.map_err(|e| SyncError::TagRead {
            path: path.to_path_buf(),
            reason: format!("read failed: {e}"),
        })?;

        let tagged_file = Probe::new(std::io::Cursor::new(&data))
            .options(self.parse_options)
            .guess_file_type()
            .map_err(|e| SyncError::TagRead {
                path: path.to_path_buf(),
                reason: format!("probe failed: {e}"),
            })?
            .read()
            .map_err(|e| SyncError::TagRead {
                path: path.to_path_buf(),
                reason: format!("parse failed: {e}"),
            })?;

        let duration_secs = tagged_file.properties().duration().as_secs();
        let tag = tagged_file.primary_tag().or_else(|| tagged_file.first_tag());

        let (title, artist) = match tag {
            Some(tag) => (
                tag.title().map(|s| s.trim().to_string()),
                tag.artist().map(|s| s.trim().to_string()),
            ),
            None => (None, None),
        };

        Ok(TrackTags {
            title: title.filter(|s| !s.is_empty()),
            artist: artist.filter(|s| !s.is_empty()),
            duration_secs,
        })
    }
}

impl Default for LoftyTagReader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TagReader for LoftyTagReader {
    async fn read(&self, path: &Path) -> Result<TrackTags> {
        self.read_tags(path).await
    }
}
