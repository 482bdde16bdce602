use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Malformed snapshot for collection {collection}: {detail}")]
    MalformedSnapshot { collection: String, detail: String },

    #[error("Snapshot unavailable for collection {collection}: {reason}")]
    AdapterUnavailable { collection: String, reason: String },

    #[error("Fetch failed for item {item}: {reason}")]
    FetchFailure { item: String, reason: String },

    #[error("Placement failed for item {item} at {path}: {source}")]
    PlacementFailure {
        item: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Archive failed for {path}: {source}")]
    ArchiveFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Local state access failed at {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write manifest {path}: {source}")]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read tags from {path}: {reason}")]
    TagRead { path: PathBuf, reason: String },

    #[error("Run cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;
