//! Remote item descriptors.
//!
//! The shapes produced by the remote snapshot adapter and consumed by the
//! reconciler. A snapshot is immutable for the duration of one run.

use crate::error::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Opaque stable identifier of one media item.
///
/// The token also appears verbatim in local filenames, which is what makes
/// local files matchable against remote entries (see [`crate::scanner`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Upstream availability of a remote entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Entry is available and fetchable
    Normal,
    /// Entry was deleted upstream
    Deleted,
    /// Entry was made private upstream
    Private,
    /// Entry is a live stream (never fetched)
    Live,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Normal => "normal",
            ItemStatus::Deleted => "deleted",
            ItemStatus::Private => "private",
            ItemStatus::Live => "live",
        }
    }
}

impl FromStr for ItemStatus {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "normal" => Ok(ItemStatus::Normal),
            "deleted" => Ok(ItemStatus::Deleted),
            "private" => Ok(ItemStatus::Private),
            "live" => Ok(ItemStatus::Live),
            _ => Err(SyncError::Config(format!("invalid item status: {s}"))),
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry of a remote collection snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDescriptor {
    pub id: ItemId,
    pub title: String,
    pub author: Option<String>,
    /// Duration in seconds, when the remote reports one
    pub duration_secs: Option<u32>,
    /// 1-based ordinal within the collection
    pub position: u32,
    pub status: ItemStatus,
}

/// Ordered snapshot of a remote collection, produced fresh each run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSnapshot {
    pub id: String,
    pub title: String,
    pub entries: Vec<ItemDescriptor>,
}
