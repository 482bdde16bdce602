//! Batch execution over a list of collections.
//!
//! Collections are processed sequentially so one output root is never owned
//! by two runs at once. A collection-level failure (snapshot unavailable,
//! malformed snapshot) is logged and the batch proceeds; only structural
//! misconfiguration above this layer aborts the process.

use core_sync::{RunReport, SyncEngine};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Aggregated results of one batch.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub collections_synced: usize,
    pub collections_failed: usize,
    pub fetched: usize,
    pub archived: usize,
    pub item_failures: usize,
    pub interrupted: bool,
}

impl BatchSummary {
    pub fn absorb(&mut self, report: &RunReport) {
        self.collections_synced += 1;
        self.fetched += report.fetched;
        self.archived += report.archived;
        self.item_failures += report.failed;
        self.interrupted |= report.interrupted;
    }
}

/// Run every collection in order, isolating per-collection failures.
pub async fn run_batch(
    engine: &SyncEngine,
    collection_ids: &[String],
    cancel: &CancellationToken,
) -> BatchSummary {
    let mut summary = BatchSummary::default();

    for collection_id in collection_ids {
        if cancel.is_cancelled() {
            warn!("batch interrupted; remaining collections skipped");
            summary.interrupted = true;
            break;
        }

        match engine
            .run_collection(collection_id, cancel.child_token())
            .await
        {
            Ok(report) => {
                if report.has_item_failures() {
                    warn!(
                        collection = %collection_id,
                        failed = report.failed,
                        "collection synced with item failures"
                    );
                }
                summary.absorb(&report);
            }
            Err(e) => {
                error!(collection = %collection_id, error = %e, "collection skipped");
                summary.collections_failed += 1;
            }
        }
    }

    info!(
        synced = summary.collections_synced,
        skipped = summary.collections_failed,
        fetched = summary.fetched,
        archived = summary.archived,
        item_failures = summary.item_failures,
        "batch complete"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_sync::RunId;

    fn report(fetched: usize, failed: usize) -> RunReport {
        RunReport {
            run_id: RunId::new(),
            collection_id: "PLtest".to_string(),
            collection_title: "Mix".to_string(),
            kept: 0,
            renamed: 0,
            fetched,
            archived: 1,
            skipped: 0,
            failed,
            interrupted: false,
            manifest_path: None,
        }
    }

    #[test]
    fn summary_accumulates_across_reports() {
        let mut summary = BatchSummary::default();
        summary.absorb(&report(3, 0));
        summary.absorb(&report(1, 2));

        assert_eq!(summary.collections_synced, 2);
        assert_eq!(summary.fetched, 4);
        assert_eq!(summary.archived, 2);
        assert_eq!(summary.item_failures, 2);
        assert!(!summary.interrupted);
    }
}
