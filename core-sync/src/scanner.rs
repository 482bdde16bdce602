//! # Local State Scanner
//!
//! Builds an id-keyed inventory of the media files already present in a
//! collection directory.
//!
//! ## Overview
//!
//! Identity lives in the filename: every synced file carries a trailing
//! ` - <id>` token before its extension. [`extract_id`] is the single
//! choke-point for that contract: swapping the matching strategy (e.g. to
//! embedded-tag lookup) only touches this module, never the reconciler.
//!
//! Files whose id cannot be extracted are not part of the inventory. They are
//! left untouched on disk and logged as unknown; the reconciler will neither
//! match nor archive them.

use crate::error::{Result, SyncError};
use crate::item::ItemId;
use crate::naming::parse_position_hint;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Length of an id token as it appears in filenames.
const ID_TOKEN_LEN: usize = 11;

/// An id-shaped token bounded by non-word characters or string edges. The
/// upstream pattern uses lookaround, which the `regex` crate does not
/// support, so the boundaries are spelled out as alternations.
static ID_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?:^|[^A-Za-z0-9_])([A-Za-z0-9_-]{{{ID_TOKEN_LEN}}})(?:[^A-Za-z0-9_-]|$)"
    ))
    .expect("valid regex")
});

/// A media file found in the collection directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEntry {
    pub path: PathBuf,
    pub id: ItemId,
    pub extension: String,
    /// Leading `NN) ` ordinal of the filename, when the naming scheme
    /// encoded one
    pub position_hint: Option<u32>,
}

impl LocalEntry {
    /// The entry's current on-disk filename.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Inventory of identified local files, keyed by item id.
pub type LocalInventory = HashMap<ItemId, LocalEntry>;

/// Extract the item id encoded in a file stem.
///
/// The token is expected in the last ` - `-separated segment of the stem,
/// so titles containing ` - ` themselves do not confuse the match.
pub fn extract_id(stem: &str) -> Option<ItemId> {
    let tail = stem.rsplit(" - ").next().unwrap_or(stem);
    ID_TOKEN.captures(tail).map(|caps| ItemId::new(&caps[1]))
}

/// Scan a collection directory into a [`LocalInventory`].
///
/// Only direct children with the expected extension are considered. A missing
/// directory is an empty inventory, not an error; the caller creates
/// directories before any write phase. The scan itself never writes.
pub async fn scan(dir: &Path, extension: &str) -> Result<LocalInventory> {
    let mut inventory = LocalInventory::new();

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(dir = %dir.display(), "media directory does not exist yet");
            return Ok(inventory);
        }
        Err(e) => {
            return Err(SyncError::Scan {
                path: dir.to_path_buf(),
                source: e,
            })
        }
    };

    while let Some(entry) = entries.next_entry().await.map_err(|e| SyncError::Scan {
        path: dir.to_path_buf(),
        source: e,
    })? {
        let path = entry.path();
        let file_type = entry.file_type().await.map_err(|e| SyncError::Scan {
            path: dir.to_path_buf(),
            source: e,
        })?;
        if !file_type.is_file() {
            continue;
        }
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !ext.eq_ignore_ascii_case(extension) {
            continue;
        }

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        match extract_id(&stem) {
            Some(id) => {
                let local = LocalEntry {
                    position_hint: parse_position_hint(&stem),
                    path: path.clone(),
                    id: id.clone(),
                    extension: ext,
                };
                if let Some(previous) = inventory.insert(id.clone(), local) {
                    // Two files claiming one id: keep the first seen, leave
                    // the other on disk as unknown.
                    warn!(
                        item = %id,
                        kept = %previous.file_name(),
                        ignored = %path.display(),
                        "duplicate id in local directory; ignoring later file"
                    );
                    inventory.insert(id, previous);
                }
            }
            None => {
                warn!(file = %path.display(), "no item id in filename; leaving file untouched");
            }
        }
    }

    debug!(dir = %dir.display(), files = inventory.len(), "scanned local state");
    Ok(inventory)
}
