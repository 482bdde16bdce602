//! # Fetch Orchestrator
//!
//! Executes a plan's `Fetch` actions under a fixed-size worker pool.
//!
//! ## Scheduling model
//!
//! `concurrency` workers (default 2, intentionally small to avoid upstream
//! rate limiting) pull from a shared queue; each worker fully processes one
//! action (backend fetch, then atomic placement) before taking the next.
//! Workers are independent: one item's failure never aborts sibling fetches,
//! and the orchestrator only returns once every worker has drained the queue.
//!
//! A short fixed pause follows every attempt, success or failure, to keep
//! request bursts off the upstream service.

use crate::error::SyncError;
use crate::item::ItemId;
use crate::layout::CollectionLayout;
use crate::manifest::{ManifestBuilder, ManifestEntry};
use crate::plan::FetchWork;
use crate::provider::FetchBackend;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Worker-pool configuration.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Number of concurrent workers
    pub concurrency: usize,
    /// Pause after every attempt, success or failure
    pub pause: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: 2,
            pause: Duration::from_secs(3),
        }
    }
}

/// Outcome of one `Fetch` action.
#[derive(Debug)]
pub struct FetchOutcome {
    pub item: ItemId,
    pub title: String,
    /// Present on success; the entry was also pushed into the shared
    /// manifest accumulator already.
    pub entry: Option<ManifestEntry>,
    pub error: Option<SyncError>,
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        self.entry.is_some()
    }
}

/// Bounded-concurrency executor for the plan's fetch actions.
pub struct FetchOrchestrator {
    backend: Arc<dyn FetchBackend>,
    config: FetchConfig,
}

impl FetchOrchestrator {
    pub fn new(backend: Arc<dyn FetchBackend>, config: FetchConfig) -> Self {
        Self { backend, config }
    }

    /// Execute all fetch actions and return one outcome per action.
    ///
    /// Successful fetches are placed under their target name in the layout's
    /// media directory and recorded in `manifest`. Cancellation drains the
    /// remaining queue as failures; completed placements stay in place.
    #[instrument(skip_all, fields(fetches = work.len()))]
    pub async fn execute(
        &self,
        work: Vec<FetchWork>,
        layout: &CollectionLayout,
        manifest: Arc<ManifestBuilder>,
        cancel: CancellationToken,
    ) -> Vec<FetchOutcome> {
        if work.is_empty() {
            return Vec::new();
        }

        let total = work.len();
        let queue: Arc<Mutex<VecDeque<FetchWork>>> = Arc::new(Mutex::new(work.into()));
        let outcomes: Arc<Mutex<Vec<FetchOutcome>>> = Arc::new(Mutex::new(Vec::with_capacity(total)));

        let workers = self.config.concurrency.max(1).min(total);
        info!(total, workers, "starting fetch phase");

        let worker_futs = (0..workers).map(|_| {
            self.worker(
                Arc::clone(&queue),
                layout,
                Arc::clone(&manifest),
                Arc::clone(&outcomes),
                cancel.clone(),
            )
        });
        futures::future::join_all(worker_futs).await;

        let outcomes = std::mem::take(&mut *outcomes.lock().await);
        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        info!(total, failed, "fetch phase complete");
        outcomes
    }

    async fn worker(
        &self,
        queue: Arc<Mutex<VecDeque<FetchWork>>>,
        layout: &CollectionLayout,
        manifest: Arc<ManifestBuilder>,
        outcomes: Arc<Mutex<Vec<FetchOutcome>>>,
        cancel: CancellationToken,
    ) {
        loop {
            let work = { queue.lock().await.pop_front() };
            let Some(work) = work else { break };

            if cancel.is_cancelled() {
                outcomes.lock().await.push(FetchOutcome {
                    item: work.descriptor.id.clone(),
                    title: work.descriptor.title.clone(),
                    entry: None,
                    error: Some(SyncError::Cancelled),
                });
                continue;
            }

            let outcome = self.process(&work, layout, &manifest).await;
            outcomes.lock().await.push(outcome);

            // Burst-pressure pause; skipped once the run is cancelled.
            if !cancel.is_cancelled() {
                tokio::time::sleep(self.config.pause).await;
            }
        }
    }

    async fn process(
        &self,
        work: &FetchWork,
        layout: &CollectionLayout,
        manifest: &ManifestBuilder,
    ) -> FetchOutcome {
        let descriptor = &work.descriptor;
        debug!(item = %descriptor.id, title = %descriptor.title, "fetching");

        let fetched = match self.backend.fetch(descriptor).await {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!(
                    item = %descriptor.id,
                    title = %descriptor.title,
                    error = %e,
                    "fetch failed"
                );
                return FetchOutcome {
                    item: descriptor.id.clone(),
                    title: descriptor.title.clone(),
                    entry: None,
                    error: Some(e),
                };
            }
        };

        let target = layout.media_dir().join(&work.target_name);
        if let Err(e) = place_atomic(&fetched.temp_path, &target).await {
            warn!(
                item = %descriptor.id,
                title = %descriptor.title,
                temp = %fetched.temp_path.display(),
                target = %target.display(),
                error = %e,
                "placement failed; temporary file retained for inspection"
            );
            return FetchOutcome {
                item: descriptor.id.clone(),
                title: descriptor.title.clone(),
                entry: None,
                error: Some(SyncError::PlacementFailure {
                    item: descriptor.id.to_string(),
                    path: target,
                    source: e,
                }),
            };
        }

        let entry = ManifestEntry {
            position: descriptor.position,
            duration_secs: fetched
                .duration_secs
                .or(descriptor.duration_secs)
                .map(i64::from)
                .unwrap_or(-1),
            title: fetched.title.clone().unwrap_or_else(|| descriptor.title.clone()),
            author: fetched
                .author
                .clone()
                .or_else(|| descriptor.author.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            relative_path: layout.manifest_relative(&work.target_name),
        };
        manifest.insert(entry.clone()).await;

        debug!(item = %descriptor.id, target = %work.target_name, "fetched and placed");
        FetchOutcome {
            item: descriptor.id.clone(),
            title: descriptor.title.clone(),
            entry: Some(entry),
            error: None,
        }
    }
}

/// Move a completed download into its final location.
///
/// `rename` when source and destination share a filesystem; otherwise a
/// copy verified against the source length, then source removal. A detected
/// short copy removes the partial destination and reports the failure, so a
/// half-written file never masquerades as synced.
pub async fn place_atomic(src: &Path, dst: &Path) -> std::io::Result<()> {
    if tokio::fs::rename(src, dst).await.is_ok() {
        return Ok(());
    }

    let expected = tokio::fs::metadata(src).await?.len();
    let written = tokio::fs::copy(src, dst).await?;
    if written != expected {
        let _ = tokio::fs::remove_file(dst).await;
        return Err(std::io::Error::new(
            std::io::ErrorKind::WriteZero,
            format!("partial write: {written} of {expected} bytes"),
        ));
    }
    // The destination is complete at this point; a stray source file is
    // only clutter, not a failed placement.
    let _ = tokio::fs::remove_file(src).await;
    Ok(())
}
