//! YouTube provider implementation
//!
//! Implements the engine's `SnapshotProvider` and `FetchBackend` seams on
//! top of the `yt-dlp` extractor binary. All remote interaction happens
//! through the subprocess; this crate never speaks HTTP itself.
//!
//! - Snapshots use flat extraction (`--flat-playlist --dump-single-json
//!   --skip-download`): metadata only, no media I/O.
//! - Fetches download one item at a time with ffmpeg post-processing into
//!   the target format, parked in a temp directory until the orchestrator
//!   places them.

pub mod error;
pub mod fetch;
pub mod snapshot;
pub mod types;

pub use error::ProviderError;
pub use fetch::YoutubeFetchBackend;
pub use snapshot::YoutubeSnapshotProvider;

/// Watch URL for one item.
pub fn watch_url(item_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={item_id}")
}

/// Playlist URL for one collection.
pub fn playlist_url(collection_id: &str) -> String {
    format!("https://www.youtube.com/playlist?list={collection_id}")
}

/// Default thumbnail URL for one item.
pub fn thumbnail_url(item_id: &str) -> String {
    format!("https://img.youtube.com/vi/{item_id}/default.jpg")
}
