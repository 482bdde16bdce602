//! Serde mappings for yt-dlp JSON output.
//!
//! Only the fields this provider consumes are declared; everything else in
//! the (large) info dictionaries is ignored.

use serde::Deserialize;
use std::path::PathBuf;

/// `--flat-playlist --dump-single-json` output for one playlist.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistDump {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub entries: Vec<PlaylistEntry>,
}

/// One flat playlist entry. Tombstoned entries (deleted/private) keep their
/// id but carry a sentinel title and no metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistEntry {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub playlist_index: Option<u32>,
    #[serde(default)]
    pub live_status: Option<String>,
}

/// `--print-json` output after a completed download.
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadDump {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub requested_downloads: Vec<RequestedDownload>,
}

/// Post-processed artifact of one download.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestedDownload {
    pub filepath: PathBuf,
}
