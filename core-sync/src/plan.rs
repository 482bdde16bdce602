//! # Reconciler
//!
//! Diffs a remote collection snapshot against the local inventory and
//! produces the run's [`SyncPlan`]: one typed action per remote id, plus one
//! `Archive` per orphaned local id.
//!
//! ## Partition invariant
//!
//! Every remote id maps to exactly one of Keep/Rename/Fetch/Skip; every local
//! id not matched to a remote id maps to exactly one Archive. No id appears
//! twice and no local file is targeted by two actions. Duplicate remote ids
//! are a malformed snapshot, not a tie to break.
//!
//! Reconciliation is pure and synchronous; no I/O happens until the plan is
//! executed.

use crate::error::{Result, SyncError};
use crate::item::{CollectionSnapshot, ItemDescriptor, ItemStatus};
use crate::naming::target_file_name;
use crate::scanner::{LocalEntry, LocalInventory};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Why a locally present file is kept although the remote entry is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepNote {
    RemoteDeleted,
    RemotePrivate,
}

impl std::fmt::Display for KeepNote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeepNote::RemoteDeleted => write!(f, "deleted upstream; local copy reused"),
            KeepNote::RemotePrivate => write!(f, "private upstream; local copy reused"),
        }
    }
}

/// Why a remote entry is not synced this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Deleted,
    Private,
    Live,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Deleted => write!(f, "deleted upstream"),
            SkipReason::Private => write!(f, "private upstream"),
            SkipReason::Live => write!(f, "live stream"),
        }
    }
}

/// One planned filesystem action.
#[derive(Debug, Clone)]
pub enum SyncAction {
    /// Local file already correct; no I/O
    Keep {
        entry: LocalEntry,
        descriptor: ItemDescriptor,
        note: Option<KeepNote>,
    },
    /// Local file exists but its expected name changed (position or title)
    Rename {
        entry: LocalEntry,
        new_name: String,
        descriptor: ItemDescriptor,
    },
    /// No local file for this id; must be retrieved
    Fetch {
        descriptor: ItemDescriptor,
        target_name: String,
    },
    /// Local id absent from the remote snapshot; relocate to the old area
    Archive { entry: LocalEntry },
    /// Remote entry unusable and no local fallback; recorded for reporting
    Skip {
        descriptor: ItemDescriptor,
        reason: SkipReason,
    },
}

/// The fetchable unit handed to the orchestrator.
#[derive(Debug, Clone)]
pub struct FetchWork {
    pub descriptor: ItemDescriptor,
    pub target_name: String,
}

/// Ordered, immutable action list for one snapshot.
///
/// Normal actions come first, ordered by remote position; Archive actions
/// are appended after, ordered by id for determinism.
#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    actions: Vec<SyncAction>,
}

impl SyncPlan {
    pub fn actions(&self) -> &[SyncAction] {
        &self.actions
    }

    pub fn iter(&self) -> impl Iterator<Item = &SyncAction> {
        self.actions.iter()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Clone out the fetch actions for the execution phase.
    pub fn fetches(&self) -> Vec<FetchWork> {
        self.actions
            .iter()
            .filter_map(|action| match action {
                SyncAction::Fetch {
                    descriptor,
                    target_name,
                } => Some(FetchWork {
                    descriptor: descriptor.clone(),
                    target_name: target_name.clone(),
                }),
                _ => None,
            })
            .collect()
    }
}

/// Compute the sync plan for one collection.
///
/// Consumes the inventory: every entry ends up in exactly one action.
pub fn reconcile(
    snapshot: &CollectionSnapshot,
    mut inventory: LocalInventory,
    extension: &str,
) -> Result<SyncPlan> {
    let mut seen = HashSet::new();
    for descriptor in &snapshot.entries {
        if !seen.insert(&descriptor.id) {
            return Err(SyncError::MalformedSnapshot {
                collection: snapshot.id.clone(),
                detail: format!("duplicate id {}", descriptor.id),
            });
        }
    }

    let mut ordered: Vec<&ItemDescriptor> = snapshot.entries.iter().collect();
    ordered.sort_by_key(|d| d.position);

    let mut actions = Vec::with_capacity(ordered.len());

    for descriptor in ordered {
        match descriptor.status {
            ItemStatus::Deleted | ItemStatus::Private => {
                let (note, reason) = if descriptor.status == ItemStatus::Deleted {
                    (KeepNote::RemoteDeleted, SkipReason::Deleted)
                } else {
                    (KeepNote::RemotePrivate, SkipReason::Private)
                };
                match inventory.remove(&descriptor.id) {
                    Some(entry) => {
                        warn!(item = %descriptor.id, "{note}");
                        actions.push(SyncAction::Keep {
                            entry,
                            descriptor: descriptor.clone(),
                            note: Some(note),
                        });
                    }
                    None => actions.push(SyncAction::Skip {
                        descriptor: descriptor.clone(),
                        reason,
                    }),
                }
            }
            ItemStatus::Live => actions.push(SyncAction::Skip {
                descriptor: descriptor.clone(),
                reason: SkipReason::Live,
            }),
            ItemStatus::Normal => {
                let target = target_file_name(
                    descriptor.position,
                    &descriptor.title,
                    &descriptor.id,
                    extension,
                );
                match inventory.remove(&descriptor.id) {
                    None => actions.push(SyncAction::Fetch {
                        descriptor: descriptor.clone(),
                        target_name: target,
                    }),
                    Some(entry) => {
                        if entry.file_name() == target {
                            actions.push(SyncAction::Keep {
                                entry,
                                descriptor: descriptor.clone(),
                                note: None,
                            });
                        } else {
                            debug!(
                                item = %descriptor.id,
                                from = %entry.file_name(),
                                to = %target,
                                "name drift detected"
                            );
                            actions.push(SyncAction::Rename {
                                entry,
                                new_name: target,
                                descriptor: descriptor.clone(),
                            });
                        }
                    }
                }
            }
        }
    }

    // Whatever the remote pass did not consume is no longer in the playlist.
    let mut orphans: Vec<LocalEntry> = inventory.into_values().collect();
    orphans.sort_by(|a, b| a.id.cmp(&b.id));
    actions.extend(orphans.into_iter().map(|entry| SyncAction::Archive { entry }));

    Ok(SyncPlan { actions })
}
