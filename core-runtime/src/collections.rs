//! Collection-list loading.
//!
//! Users maintain plain text files of playlist links; anything shaped like a
//! collection id is extracted, so full URLs, bare ids, and surrounding notes
//! all work. A missing list file is created empty so the user has a place to
//! paste links into.

use crate::error::{Result, RuntimeError};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info};

/// Collection id following a `list=` query parameter.
static LINKED_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"list=([A-Za-z0-9_-]+)").expect("valid regex"));

/// A line that is nothing but a collection id.
static BARE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{12,}$").expect("valid regex"));

/// Load the collection ids referenced by a list file.
///
/// Ids are deduplicated and returned sorted, so batch order is stable across
/// runs regardless of how the file is edited.
pub async fn load_collection_list(path: &Path) -> Result<Vec<String>> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "collection list missing; creating empty file");
            tokio::fs::write(path, "").await.map_err(|e| RuntimeError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(RuntimeError::Io {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    let mut ids = BTreeSet::new();
    for caps in LINKED_ID.captures_iter(&text) {
        ids.insert(caps[1].to_string());
    }
    for line in text.lines() {
        let line = line.trim();
        if BARE_ID.is_match(line) {
            ids.insert(line.to_string());
        }
    }

    debug!(path = %path.display(), count = ids.len(), "loaded collection list");
    Ok(ids.into_iter().collect())
}
