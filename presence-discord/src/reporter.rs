//! The presence loop: poll, connect, publish.
//!
//! Poll and backoff intervals mirror what the upstream Discord client
//! tolerates: a 15 s poll, 30 s after a failed publish, 60 s after a scan
//! error. All failures stay inside this loop.

use crate::ipc::DiscordIpc;
use crate::watch::{NowPlaying, PlayerWatcher};
use provider_youtube::{playlist_url, thumbnail_url, watch_url};
use serde_json::json;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_secs(15);
const RECONNECT_BACKOFF: Duration = Duration::from_secs(15);
const PUBLISH_FAILURE_BACKOFF: Duration = Duration::from_secs(30);

/// Discord activity type "listening".
const ACTIVITY_LISTENING: u8 = 2;

/// Button labels render at most this many characters.
const BUTTON_LABEL_LIMIT: usize = 25;

/// Long-running presence reporter.
pub struct PresenceReporter {
    client_id: String,
    watcher: PlayerWatcher,
    ipc: Option<DiscordIpc>,
}

impl PresenceReporter {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            watcher: PlayerWatcher::new(),
            ipc: None,
        }
    }

    /// Run until cancelled. Never returns an error: presence is best-effort.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut interval = Duration::from_secs(0);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
            interval = POLL_INTERVAL;

            let Some(now) = self.watcher.scan().await else {
                continue;
            };

            if self.ipc.is_none() {
                match DiscordIpc::connect(&self.client_id).await {
                    Ok(ipc) => self.ipc = Some(ipc),
                    Err(e) => {
                        debug!(error = %e, "Discord unavailable");
                        interval = RECONNECT_BACKOFF;
                        continue;
                    }
                }
            }

            let activity = build_activity(&now);
            if let Some(ipc) = self.ipc.as_mut() {
                if let Err(e) = ipc.set_activity(activity).await {
                    warn!(error = %e, "activity publish failed; reconnecting later");
                    self.ipc = None;
                    interval = PUBLISH_FAILURE_BACKOFF;
                }
            }
        }
    }
}

fn truncate_label(label: &str, limit: usize) -> String {
    if label.chars().count() <= limit {
        label.to_string()
    } else {
        label.chars().take(limit).collect()
    }
}

/// Build the SET_ACTIVITY payload for one playing track.
fn build_activity(now: &NowPlaying) -> serde_json::Value {
    let mut watch = watch_url(now.item_id.as_str());
    let mut watch_label = "Listen on YouTube".to_string();
    let mut buttons = Vec::new();

    if let Some(collection) = &now.collection {
        watch.push_str(&format!("&list={}", collection.id));
        if let Some(position) = now.position {
            watch.push_str(&format!("&index={}", position.saturating_sub(1)));
            watch_label.push_str(&format!(" ({position})"));
        }
    }
    buttons.push(json!({ "label": watch_label, "url": watch }));

    if let Some(collection) = &now.collection {
        buttons.push(json!({
            "label": format!(
                "Playlist: {}",
                truncate_label(&collection.title, BUTTON_LABEL_LIMIT)
            ),
            "url": playlist_url(&collection.id),
        }));
    }

    json!({
        "details": now.title,
        "state": format!("By: {}", now.author),
        "type": ACTIVITY_LISTENING,
        "assets": {
            "large_image": thumbnail_url(now.item_id.as_str()),
            "large_text": format!("Via: {}", now.player.name),
            "small_image": now.player.icon,
        },
        "buttons": buttons,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use core_sync::layout::CollectionInfo;
    use core_sync::ItemId;

    fn now_playing(with_collection: bool) -> NowPlaying {
        NowPlaying {
            item_id: ItemId::from("dQw4w9WgXcQ"),
            title: "Song A".to_string(),
            author: "Artist".to_string(),
            position: Some(3),
            player: crate::players::lookup_player("vlc").unwrap(),
            collection: with_collection.then(|| CollectionInfo {
                id: "PLtest".to_string(),
                title: "A Rather Long Playlist Title Indeed".to_string(),
                last_synced_at: Utc::now(),
            }),
        }
    }

    #[test]
    fn activity_carries_track_and_player_details() {
        let activity = build_activity(&now_playing(false));
        assert_eq!(activity["details"], "Song A");
        assert_eq!(activity["state"], "By: Artist");
        assert_eq!(activity["type"], 2);
        assert_eq!(
            activity["assets"]["large_image"],
            "https://img.youtube.com/vi/dQw4w9WgXcQ/default.jpg"
        );
        // Without a side-file there is only the watch button.
        assert_eq!(activity["buttons"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn collection_adds_playlist_button_and_index() {
        let activity = build_activity(&now_playing(true));
        let buttons = activity["buttons"].as_array().unwrap();
        assert_eq!(buttons.len(), 2);
        let watch = buttons[0]["url"].as_str().unwrap();
        assert!(watch.contains("list=PLtest"));
        assert!(watch.contains("index=2"));
        let label = buttons[1]["label"].as_str().unwrap();
        assert!(label.starts_with("Playlist: "));
        assert!(label.chars().count() <= "Playlist: ".len() + BUTTON_LABEL_LIMIT);
    }
}
