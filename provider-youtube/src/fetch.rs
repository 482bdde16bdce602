//! Per-item download with post-processing.
//!
//! Each fetch is one `yt-dlp` invocation producing a post-processed file in
//! the backend's temp directory. Transient failures are retried here, under
//! the injected [`RetryPolicy`]; the orchestrator treats the final error as
//! final and never re-invokes within a run.

use crate::error::ProviderError;
use crate::types::DownloadDump;
use crate::watch_url;
use async_trait::async_trait;
use core_runtime::MediaKind;
use core_sync::error::SyncError;
use core_sync::item::ItemDescriptor;
use core_sync::provider::{FetchBackend, FetchedMedia, RetryPolicy};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

/// Fetch backend shelling out to `yt-dlp` with ffmpeg post-processing.
pub struct YoutubeFetchBackend {
    binary: PathBuf,
    media: MediaKind,
    temp_dir: PathBuf,
    cookie_file: Option<PathBuf>,
    ffmpeg_location: Option<PathBuf>,
    retry: RetryPolicy,
}

impl YoutubeFetchBackend {
    pub fn new(media: MediaKind, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            binary: PathBuf::from("yt-dlp"),
            media,
            temp_dir: temp_dir.into(),
            cookie_file: None,
            ffmpeg_location: None,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_cookie_file(mut self, path: Option<PathBuf>) -> Self {
        self.cookie_file = path;
        self
    }

    /// Explicit ffmpeg location, when it is not on `PATH`.
    pub fn with_ffmpeg_location(mut self, path: Option<PathBuf>) -> Self {
        self.ffmpeg_location = path;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Arguments for one download, minus the URL.
    fn download_args(&self) -> Vec<String> {
        let mut args = vec![
            "--no-warnings".to_string(),
            "--no-playlist".to_string(),
            "--print-json".to_string(),
            "--output".to_string(),
            self.temp_dir.join("%(id)s.%(ext)s").display().to_string(),
        ];
        match self.media {
            MediaKind::Audio => args.extend(
                [
                    "--format",
                    "bestaudio",
                    "--extract-audio",
                    "--audio-format",
                    "mp3",
                    "--audio-quality",
                    "192K",
                    "--embed-metadata",
                    "--embed-thumbnail",
                ]
                .map(String::from),
            ),
            MediaKind::Video => args.extend(
                [
                    "--format",
                    "bestvideo[ext=mp4][height<=1080]+bestaudio[ext=m4a]/best[ext=mp4]",
                    "--remux-video",
                    "mp4",
                    "--embed-metadata",
                    "--embed-thumbnail",
                ]
                .map(String::from),
            ),
        }
        if let Some(cookies) = &self.cookie_file {
            args.push("--cookies".to_string());
            args.push(cookies.display().to_string());
        }
        if let Some(ffmpeg) = &self.ffmpeg_location {
            args.push("--ffmpeg-location".to_string());
            args.push(ffmpeg.display().to_string());
        }
        args
    }

    async fn fetch_once(&self, item: &ItemDescriptor) -> Result<FetchedMedia, ProviderError> {
        let output = Command::new(&self.binary)
            .args(self.download_args())
            .arg(watch_url(item.id.as_str()))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ProviderError::Launch {
                binary: self.binary.display().to_string(),
                source: e,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProviderError::Download(
                stderr.lines().last().unwrap_or("unknown error").to_string(),
            ));
        }

        let dump: DownloadDump = serde_json::from_slice(&output.stdout)
            .map_err(|e| ProviderError::InvalidOutput(e.to_string()))?;

        let temp_path = match dump.requested_downloads.first() {
            Some(download) => download.filepath.clone(),
            // Older extractor versions omit the download list; the output
            // template makes the produced path predictable.
            None => self
                .temp_dir
                .join(format!("{}.{}", item.id, self.media.extension())),
        };
        if !temp_path.is_file() {
            return Err(ProviderError::Download(format!(
                "no file produced at {}",
                temp_path.display()
            )));
        }

        Ok(FetchedMedia {
            temp_path,
            title: dump.title,
            author: dump.uploader,
            duration_secs: dump.duration.map(|d| d.round() as u32),
        })
    }
}

#[async_trait]
impl FetchBackend for YoutubeFetchBackend {
    #[instrument(skip(self, item), fields(item = %item.id))]
    async fn fetch(&self, item: &ItemDescriptor) -> core_sync::Result<FetchedMedia> {
        let mut attempt = 1;
        loop {
            match self.fetch_once(item).await {
                Ok(media) => {
                    debug!(path = %media.temp_path.display(), "download complete");
                    return Ok(media);
                }
                Err(e) if self.retry.should_retry(attempt) => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        attempt,
                        max = self.retry.max_attempts,
                        error = %e,
                        "download failed, retrying in {}ms",
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(SyncError::FetchFailure {
                        item: item.id.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }
    }
}
