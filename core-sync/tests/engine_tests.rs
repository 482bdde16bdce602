//! End-to-end tests for full sync runs over fake collaborators.
//!
//! The provider, backend, and tag reader are in-memory fakes; everything
//! else (scanner, reconciler, orchestrator, archive, manifest) runs for real
//! against a temporary output root.

use async_trait::async_trait;
use core_sync::{
    CollectionSnapshot, EngineConfig, FetchBackend, FetchConfig, FetchedMedia, ItemDescriptor,
    ItemId, ItemStatus, Result, SnapshotProvider, SyncEngine, SyncError, TagReader, TrackTags,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

struct FakeProvider {
    snapshot: Option<CollectionSnapshot>,
}

#[async_trait]
impl SnapshotProvider for FakeProvider {
    async fn snapshot(&self, collection_id: &str) -> Result<CollectionSnapshot> {
        self.snapshot
            .clone()
            .ok_or_else(|| SyncError::AdapterUnavailable {
                collection: collection_id.to_string(),
                reason: "offline".to_string(),
            })
    }
}

struct FakeBackend {
    temp_dir: PathBuf,
    fail_ids: HashSet<String>,
}

#[async_trait]
impl FetchBackend for FakeBackend {
    async fn fetch(&self, item: &ItemDescriptor) -> Result<FetchedMedia> {
        if self.fail_ids.contains(item.id.as_str()) {
            return Err(SyncError::FetchFailure {
                item: item.id.to_string(),
                reason: "simulated outage".to_string(),
            });
        }
        let temp_path = self.temp_dir.join(format!("{}.mp3", item.id));
        tokio::fs::write(&temp_path, item.id.as_str()).await.unwrap();
        Ok(FetchedMedia {
            temp_path,
            title: Some(item.title.clone()),
            author: item.author.clone(),
            duration_secs: item.duration_secs,
        })
    }
}

struct FakeTagReader;

#[async_trait]
impl TagReader for FakeTagReader {
    async fn read(&self, _path: &Path) -> Result<TrackTags> {
        Ok(TrackTags {
            title: Some("Tagged Title".to_string()),
            artist: Some("Tagged Artist".to_string()),
            duration_secs: 123,
        })
    }
}

fn descriptor(id: &str, position: u32, title: &str, status: ItemStatus) -> ItemDescriptor {
    ItemDescriptor {
        id: ItemId::from(id),
        title: title.to_string(),
        author: Some("Artist".to_string()),
        duration_secs: Some(180),
        position,
        status,
    }
}

fn snapshot(entries: Vec<ItemDescriptor>) -> CollectionSnapshot {
    CollectionSnapshot {
        id: "PLtest".to_string(),
        title: "Mix".to_string(),
        entries,
    }
}

struct Harness {
    engine: SyncEngine,
    root: tempfile::TempDir,
    _backend_tmp: tempfile::TempDir,
}

fn harness(snapshot: Option<CollectionSnapshot>, fail_ids: &[&str]) -> Harness {
    let root = tempfile::tempdir().unwrap();
    let backend_tmp = tempfile::tempdir().unwrap();

    let engine = SyncEngine::new(
        Arc::new(FakeProvider { snapshot }),
        Arc::new(FakeBackend {
            temp_dir: backend_tmp.path().to_path_buf(),
            fail_ids: fail_ids.iter().map(|s| s.to_string()).collect(),
        }),
        Arc::new(FakeTagReader),
        EngineConfig {
            output_root: root.path().to_path_buf(),
            extension: "mp3".to_string(),
            fetch: FetchConfig {
                concurrency: 2,
                pause: Duration::from_millis(0),
            },
        },
    );

    Harness {
        engine,
        root,
        _backend_tmp: backend_tmp,
    }
}

fn media_dir(root: &Path) -> PathBuf {
    root.join(".playsync").join("PLtest")
}

#[tokio::test]
async fn keep_plus_fetch_produces_an_ordered_manifest() {
    let h = harness(
        Some(snapshot(vec![
            descriptor("aaaaaaaaaaa", 1, "Song A", ItemStatus::Normal),
            descriptor("bbbbbbbbbbb", 2, "Song B", ItemStatus::Normal),
        ])),
        &[],
    );

    // "a" is already synced under its correct name.
    let media = media_dir(h.root.path());
    std::fs::create_dir_all(&media).unwrap();
    std::fs::write(media.join("01) Song A - aaaaaaaaaaa.mp3"), b"a").unwrap();

    let report = h
        .engine
        .run_collection("PLtest", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.kept, 1);
    assert_eq!(report.fetched, 1);
    assert_eq!(report.failed, 0);
    assert!(media.join("02) Song B - bbbbbbbbbbb.mp3").exists());

    let manifest = std::fs::read_to_string(report.manifest_path.unwrap()).unwrap();
    let extinf: Vec<&str> = manifest
        .lines()
        .filter(|l| l.starts_with("#EXTINF:"))
        .collect();
    assert_eq!(extinf.len(), 2);
    assert!(extinf[0].contains("Song A"));
    assert!(extinf[1].contains("Song B"));
    assert!(manifest.contains("./.playsync/PLtest/01) Song A - aaaaaaaaaaa.mp3"));
    assert!(manifest.contains("./.playsync/PLtest/02) Song B - bbbbbbbbbbb.mp3"));
}

#[tokio::test]
async fn removed_item_is_archived_not_deleted() {
    let h = harness(
        Some(snapshot(vec![descriptor(
            "aaaaaaaaaaa",
            1,
            "Song A",
            ItemStatus::Normal,
        )])),
        &[],
    );

    let media = media_dir(h.root.path());
    std::fs::create_dir_all(&media).unwrap();
    std::fs::write(media.join("01) Song A - aaaaaaaaaaa.mp3"), b"a").unwrap();
    std::fs::write(media.join("02) Gone - ccccccccccc.mp3"), b"c").unwrap();

    let report = h
        .engine
        .run_collection("PLtest", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.kept, 1);
    assert_eq!(report.archived, 1);
    assert!(!media.join("02) Gone - ccccccccccc.mp3").exists());
    let archived = h
        .root
        .path()
        .join(".playsync/old/PLtest/02) Gone - ccccccccccc.mp3");
    assert!(archived.exists());
    assert_eq!(std::fs::read(archived).unwrap(), b"c");

    let manifest = std::fs::read_to_string(report.manifest_path.unwrap()).unwrap();
    assert!(!manifest.contains("ccccccccccc"));
}

#[tokio::test]
async fn failed_fetch_is_isolated_and_absent_from_the_manifest() {
    let h = harness(
        Some(snapshot(vec![
            descriptor("aaaaaaaaaaa", 1, "A", ItemStatus::Normal),
            descriptor("bbbbbbbbbbb", 2, "B", ItemStatus::Normal),
            descriptor("ccccccccccc", 3, "C", ItemStatus::Normal),
        ])),
        &["bbbbbbbbbbb"],
    );

    let report = h
        .engine
        .run_collection("PLtest", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.fetched, 2);
    assert_eq!(report.failed, 1);

    let manifest = std::fs::read_to_string(report.manifest_path.unwrap()).unwrap();
    assert_eq!(manifest.matches("#EXTINF:").count(), 2);
    assert!(!manifest.contains("bbbbbbbbbbb"));
    // No blank placeholder: position 2 is simply absent.
    assert!(manifest.contains("01) A - aaaaaaaaaaa.mp3"));
    assert!(manifest.contains("03) C - ccccccccccc.mp3"));
}

#[tokio::test]
async fn second_run_is_all_keeps() {
    let snap = snapshot(vec![
        descriptor("aaaaaaaaaaa", 1, "Song A", ItemStatus::Normal),
        descriptor("bbbbbbbbbbb", 2, "Song B", ItemStatus::Normal),
    ]);
    let h = harness(Some(snap), &[]);

    let first = h
        .engine
        .run_collection("PLtest", CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(first.fetched, 2);

    let second = h
        .engine
        .run_collection("PLtest", CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(second.kept, 2);
    assert_eq!(second.fetched, 0);
    assert_eq!(second.renamed, 0);
    assert_eq!(second.archived, 0);
    assert_eq!(second.failed, 0);
}

#[tokio::test]
async fn position_shuffle_renames_in_place_without_refetching() {
    let h = harness(
        Some(snapshot(vec![
            descriptor("bbbbbbbbbbb", 1, "Song B", ItemStatus::Normal),
            descriptor("aaaaaaaaaaa", 2, "Song A", ItemStatus::Normal),
        ])),
        &[],
    );

    let media = media_dir(h.root.path());
    std::fs::create_dir_all(&media).unwrap();
    std::fs::write(media.join("01) Song A - aaaaaaaaaaa.mp3"), b"a").unwrap();
    std::fs::write(media.join("02) Song B - bbbbbbbbbbb.mp3"), b"b").unwrap();

    let report = h
        .engine
        .run_collection("PLtest", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.renamed, 2);
    assert_eq!(report.fetched, 0);
    assert!(media.join("01) Song B - bbbbbbbbbbb.mp3").exists());
    assert!(media.join("02) Song A - aaaaaaaaaaa.mp3").exists());
}

#[tokio::test]
async fn deleted_upstream_item_is_kept_with_tag_metadata() {
    let h = harness(
        Some(snapshot(vec![descriptor(
            "aaaaaaaaaaa",
            1,
            "[Deleted video]",
            ItemStatus::Deleted,
        )])),
        &[],
    );

    let media = media_dir(h.root.path());
    std::fs::create_dir_all(&media).unwrap();
    std::fs::write(media.join("01) Song A - aaaaaaaaaaa.mp3"), b"a").unwrap();

    let report = h
        .engine
        .run_collection("PLtest", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.kept, 1);
    let manifest = std::fs::read_to_string(report.manifest_path.unwrap()).unwrap();
    // Metadata comes from the local tags, not from the upstream tombstone.
    assert!(manifest.contains("#EXTINF:123,Tagged Title - By: Tagged Artist"));
    assert!(!manifest.contains("[Deleted video]"));
}

#[tokio::test]
async fn unavailable_adapter_fails_only_this_collection() {
    let h = harness(None, &[]);

    let err = h
        .engine
        .run_collection("PLtest", CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::AdapterUnavailable { .. }));
    // Nothing was created under the root.
    assert!(!h.root.path().join(".playsync").exists());
}

#[tokio::test]
async fn cancelled_run_leaves_previous_manifest_untouched() {
    let snap = snapshot(vec![descriptor("aaaaaaaaaaa", 1, "A", ItemStatus::Normal)]);
    let h = harness(Some(snap), &[]);

    // First run writes a manifest.
    let first = h
        .engine
        .run_collection("PLtest", CancellationToken::new())
        .await
        .unwrap();
    let manifest_path = first.manifest_path.unwrap();
    let before = std::fs::read_to_string(&manifest_path).unwrap();

    // Second run starts already cancelled.
    let cancel = CancellationToken::new();
    cancel.cancel();
    let report = h.engine.run_collection("PLtest", cancel).await.unwrap();

    assert!(report.interrupted);
    assert!(report.manifest_path.is_none());
    assert_eq!(std::fs::read_to_string(&manifest_path).unwrap(), before);
}

#[tokio::test]
async fn collection_side_file_records_title_and_id() {
    let h = harness(
        Some(snapshot(vec![descriptor(
            "aaaaaaaaaaa",
            1,
            "A",
            ItemStatus::Normal,
        )])),
        &[],
    );

    h.engine
        .run_collection("PLtest", CancellationToken::new())
        .await
        .unwrap();

    let side = std::fs::read_to_string(h.root.path().join(".playsync/PLtest.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&side).unwrap();
    assert_eq!(value["id"], "PLtest");
    assert_eq!(value["title"], "Mix");
}
