//! # Sync Engine
//!
//! One-run orchestration over a single collection: snapshot, scan,
//! reconcile, execute, manifest.
//!
//! ## Workflow
//!
//! 1. Obtain the remote snapshot (extraction-only; no media I/O)
//! 2. Ensure the collection's on-disk layout exists
//! 3. Scan the media directory into the local inventory
//! 4. Reconcile snapshot against inventory into a `SyncPlan`
//! 5. Record the collection side-file
//! 6. Accumulate manifest entries for Keep/Rename actions (no fetch pending)
//! 7. Execute Archive moves and the Fetch worker pool in parallel
//! 8. Write the manifest once the execution phase fully drains
//!
//! An interrupted run skips step 8, so the previous run's manifest stays
//! valid on disk; everything already placed is picked up as `Keep` next run.

use crate::archive::ArchivePolicy;
use crate::error::Result;
use crate::item::ItemDescriptor;
use crate::layout::{CollectionInfo, CollectionLayout};
use crate::manifest::{remove_stale_manifests, ManifestBuilder, ManifestEntry};
use crate::orchestrator::{FetchConfig, FetchOrchestrator};
use crate::plan::{reconcile, SyncAction};
use crate::provider::{FetchBackend, SnapshotProvider, TagReader};
use crate::scanner::{scan, LocalEntry};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Unique identifier of one sync run, for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Engine configuration for one output root.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Root directory owning the collections synced by this engine
    pub output_root: PathBuf,
    /// Media file extension produced by the fetch backend (e.g. "mp3")
    pub extension: String,
    /// Worker-pool settings for the fetch phase
    pub fetch: FetchConfig,
}

/// What one collection run did.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: RunId,
    pub collection_id: String,
    pub collection_title: String,
    pub kept: usize,
    pub renamed: usize,
    pub fetched: usize,
    pub archived: usize,
    pub skipped: usize,
    pub failed: usize,
    /// True when the run was cancelled mid-execution; the manifest write was
    /// skipped and the previous manifest remains valid.
    pub interrupted: bool,
    pub manifest_path: Option<PathBuf>,
}

impl RunReport {
    fn new(run_id: RunId, collection_id: &str, collection_title: &str) -> Self {
        Self {
            run_id,
            collection_id: collection_id.to_string(),
            collection_title: collection_title.to_string(),
            kept: 0,
            renamed: 0,
            fetched: 0,
            archived: 0,
            skipped: 0,
            failed: 0,
            interrupted: false,
            manifest_path: None,
        }
    }

    /// Item-level failures occurred. These never affect the process exit
    /// status, which reflects fatal errors only.
    pub fn has_item_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Orchestrates full sync runs, one collection at a time.
///
/// The target directory is exclusively owned by one run at a time; callers
/// serialize invocations per output root.
pub struct SyncEngine {
    provider: Arc<dyn SnapshotProvider>,
    orchestrator: FetchOrchestrator,
    tags: Arc<dyn TagReader>,
    config: EngineConfig,
}

impl SyncEngine {
    pub fn new(
        provider: Arc<dyn SnapshotProvider>,
        backend: Arc<dyn FetchBackend>,
        tags: Arc<dyn TagReader>,
        config: EngineConfig,
    ) -> Self {
        let orchestrator = FetchOrchestrator::new(backend, config.fetch.clone());
        Self {
            provider,
            orchestrator,
            tags,
            config,
        }
    }

    /// Run one full sync of `collection_id` under the configured root.
    #[instrument(skip(self, cancel), fields(collection = %collection_id))]
    pub async fn run_collection(
        &self,
        collection_id: &str,
        cancel: CancellationToken,
    ) -> Result<RunReport> {
        let run_id = RunId::new();
        info!(%run_id, "starting sync run");

        let snapshot = self.provider.snapshot(collection_id).await?;
        let layout = CollectionLayout::new(&self.config.output_root, snapshot.id.as_str());
        layout.ensure_dirs().await?;

        let inventory = scan(&layout.media_dir(), &self.config.extension).await?;
        let plan = reconcile(&snapshot, inventory, &self.config.extension)?;
        info!(
            %run_id,
            title = %snapshot.title,
            entries = snapshot.entries.len(),
            actions = plan.len(),
            "plan computed"
        );

        if let Err(e) = CollectionInfo::from_snapshot(&snapshot)
            .save(&layout.side_file())
            .await
        {
            warn!(%run_id, error = %e, "side-file write failed; continuing");
        }

        let mut report = RunReport::new(run_id, &snapshot.id, &snapshot.title);
        let manifest = Arc::new(ManifestBuilder::new());
        let mut archives: Vec<LocalEntry> = Vec::new();

        for action in plan.iter() {
            match action {
                SyncAction::Keep {
                    entry,
                    descriptor,
                    note,
                } => {
                    // The reconciler already surfaced the keep-note
                    // diagnostic; here it only decides the metadata source.
                    let manifest_entry = match note {
                        Some(_) => self.entry_from_tags(entry, descriptor, &layout).await,
                        None => entry_from_descriptor(descriptor, &entry.file_name(), &layout),
                    };
                    manifest.insert(manifest_entry).await;
                    report.kept += 1;
                }
                SyncAction::Rename {
                    entry,
                    new_name,
                    descriptor,
                } => {
                    let target = layout.media_dir().join(new_name);
                    match tokio::fs::rename(&entry.path, &target).await {
                        Ok(()) => {
                            manifest
                                .insert(entry_from_descriptor(descriptor, new_name, &layout))
                                .await;
                            report.renamed += 1;
                        }
                        Err(e) => {
                            // File is still valid under its old name; the
                            // manifest reflects what is actually on disk.
                            warn!(
                                item = %descriptor.id,
                                from = %entry.file_name(),
                                to = %new_name,
                                error = %e,
                                "rename failed"
                            );
                            manifest
                                .insert(entry_from_descriptor(
                                    descriptor,
                                    &entry.file_name(),
                                    &layout,
                                ))
                                .await;
                            report.failed += 1;
                        }
                    }
                }
                SyncAction::Archive { entry } => archives.push(entry.clone()),
                SyncAction::Skip { descriptor, reason } => {
                    info!(item = %descriptor.id, title = %descriptor.title, "skipped: {reason}");
                    report.skipped += 1;
                }
                SyncAction::Fetch { .. } => {}
            }
        }

        // Archive moves and the fetch pool run side by side; neither phase
        // depends on the other's outcome.
        let policy = ArchivePolicy::new(layout.old_dir());
        let archive_phase = async {
            let mut archived = 0usize;
            let mut failed = 0usize;
            for entry in &archives {
                match policy.archive(entry).await {
                    Ok(_) => archived += 1,
                    Err(e) => {
                        warn!(item = %entry.id, error = %e, "archive failed; file left in place");
                        failed += 1;
                    }
                }
            }
            (archived, failed)
        };
        let fetch_phase =
            self.orchestrator
                .execute(plan.fetches(), &layout, Arc::clone(&manifest), cancel.clone());

        let (outcomes, (archived, archive_failures)) = tokio::join!(fetch_phase, archive_phase);
        report.archived = archived;
        report.failed += archive_failures;
        report.fetched = outcomes.iter().filter(|o| o.is_success()).count();
        report.failed += outcomes.iter().filter(|o| !o.is_success()).count();

        if cancel.is_cancelled() {
            report.interrupted = true;
            warn!(%run_id, "run interrupted; manifest write skipped");
            return Ok(report);
        }

        let manifest_path = layout.manifest_path(&snapshot.title);
        remove_stale_manifests(&layout, &manifest_path).await?;
        manifest.write_to(&manifest_path).await?;
        report.manifest_path = Some(manifest_path);

        info!(
            %run_id,
            kept = report.kept,
            renamed = report.renamed,
            fetched = report.fetched,
            archived = report.archived,
            skipped = report.skipped,
            failed = report.failed,
            "sync run complete"
        );
        Ok(report)
    }

    /// Manifest entry for a kept file whose remote metadata is gone: the
    /// local copy's embedded tags are the only remaining source of truth.
    async fn entry_from_tags(
        &self,
        entry: &LocalEntry,
        descriptor: &ItemDescriptor,
        layout: &CollectionLayout,
    ) -> ManifestEntry {
        let tags = match self.tags.read(&entry.path).await {
            Ok(tags) => tags,
            Err(e) => {
                warn!(item = %entry.id, error = %e, "tag read failed; using filename");
                Default::default()
            }
        };
        let stem_title = entry
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| descriptor.title.clone());
        ManifestEntry {
            position: descriptor.position,
            duration_secs: if tags.duration_secs > 0 {
                tags.duration_secs as i64
            } else {
                descriptor.duration_secs.map(i64::from).unwrap_or(-1)
            },
            title: tags.title.unwrap_or(stem_title),
            author: tags
                .artist
                .or_else(|| descriptor.author.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            relative_path: layout.manifest_relative(&entry.file_name()),
        }
    }
}

fn entry_from_descriptor(
    descriptor: &ItemDescriptor,
    file_name: &str,
    layout: &CollectionLayout,
) -> ManifestEntry {
    ManifestEntry {
        position: descriptor.position,
        duration_secs: descriptor.duration_secs.map(i64::from).unwrap_or(-1),
        title: descriptor.title.clone(),
        author: descriptor
            .author
            .clone()
            .unwrap_or_else(|| "Unknown".to_string()),
        relative_path: layout.manifest_relative(file_name),
    }
}
