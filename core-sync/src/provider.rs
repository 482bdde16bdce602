//! Trait seams for the external collaborators of a sync run.
//!
//! The engine consumes three capabilities it does not implement itself: the
//! remote snapshot adapter, the media fetch backend, and a tag reader for
//! already-downloaded files. Each is an async trait so tests can substitute
//! in-memory fakes and so alternative providers can be dropped in without
//! touching the reconciler or orchestrator.

use crate::error::Result;
use crate::item::{CollectionSnapshot, ItemDescriptor};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Remote-collection metadata provider.
///
/// Must operate in extraction-only mode: producing a snapshot never downloads
/// media. Failures surface per collection and never abort a batch run.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    async fn snapshot(&self, collection_id: &str) -> Result<CollectionSnapshot>;
}

/// A successfully fetched media file, parked in a temporary location until
/// the orchestrator places it.
#[derive(Debug, Clone)]
pub struct FetchedMedia {
    /// Where the backend produced the file; the orchestrator moves it to its
    /// final name and never leaves a successful fetch here.
    pub temp_path: PathBuf,
    /// Title as observed during the fetch (may be fresher than the snapshot)
    pub title: Option<String>,
    pub author: Option<String>,
    pub duration_secs: Option<u32>,
}

/// Media fetch/transcode backend.
///
/// The backend owns its internal bounded retry (see [`RetryPolicy`]); callers
/// treat an error as final and never re-invoke for the same run.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FetchBackend: Send + Sync {
    async fn fetch(&self, item: &ItemDescriptor) -> Result<FetchedMedia>;
}

/// Tags read from a local media file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub duration_secs: u64,
}

/// Reader for embedded tag data of already-downloaded files.
///
/// Used when a remote entry is gone (deleted/private) and the only remaining
/// source of display metadata is the local copy itself.
#[async_trait]
pub trait TagReader: Send + Sync {
    async fn read(&self, path: &Path) -> Result<TrackTags>;
}

/// Bounded-retry configuration injected into fetch backends.
///
/// One policy object instead of ad hoc retry/sleep loops per call site;
/// delays grow exponentially from `base_delay` and are capped at
/// `max_delay`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay to sleep before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }

    /// Whether another attempt is allowed after `attempt` failures.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_delays_grow_exponentially_and_cap() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(350));
        assert_eq!(policy.delay_for(10), Duration::from_millis(350));
    }

    #[test]
    fn retry_stops_at_max_attempts() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
    }
}
