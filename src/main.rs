//! playsync: keep local directories in sync with remote playlists.
//!
//! One invocation syncs every collection named in the audio/video list files
//! into their output roots, writing one M3U manifest per collection. See the
//! crates under the workspace for the actual machinery; this binary only
//! parses arguments, probes external tools, and drives the batch.

mod batch;
mod bootstrap;

use anyhow::Context;
use clap::Parser;
use core_runtime::{init_logging, load_collection_list, LogFormat, LoggingConfig, MediaKind, RunConfig};
use core_sync::{EngineConfig, FetchConfig, SyncEngine};
use core_tags::LoftyTagReader;
use provider_youtube::{YoutubeFetchBackend, YoutubeSnapshotProvider};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "playsync", version, about = "Sync remote playlists into local directories")]
struct Cli {
    /// Output root for audio collections (default: the platform music dir)
    #[arg(long)]
    audio_dir: Option<PathBuf>,

    /// Output root for video collections (default: the platform video dir)
    #[arg(long)]
    video_dir: Option<PathBuf>,

    /// File listing audio playlist links or ids
    #[arg(long, default_value = "playlists_audio.txt")]
    audio_list: PathBuf,

    /// File listing video playlist links or ids
    #[arg(long, default_value = "playlists_video.txt")]
    video_list: PathBuf,

    /// Fetch worker-pool width
    #[arg(long, default_value_t = 2)]
    concurrency: usize,

    /// Cookie file for private collections
    #[arg(long)]
    cookies: Option<PathBuf>,

    /// Explicit yt-dlp location
    #[arg(long)]
    ytdlp: Option<PathBuf>,

    /// Report the currently playing synced track to Discord
    #[cfg(unix)]
    #[arg(long)]
    presence: bool,

    /// Log output format: pretty, compact, or json
    #[arg(long, default_value = "compact")]
    log_format: String,

    /// Default log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let format: LogFormat = cli.log_format.parse()?;
    init_logging(
        LoggingConfig::default()
            .with_format(format)
            .with_default_level(cli.log_level.clone()),
    )?;

    let tools = bootstrap::ensure_tools(cli.ytdlp.clone()).await?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received; finishing in-flight work");
                cancel.cancel();
            }
        });
    }

    #[cfg(unix)]
    if cli.presence {
        let reporter = presence_discord::PresenceReporter::new(presence_discord::DEFAULT_CLIENT_ID);
        tokio::spawn(reporter.run(cancel.child_token()));
        info!("presence reporting enabled");
    }

    let audio_ids = load_collection_list(&cli.audio_list).await?;
    let video_ids = load_collection_list(&cli.video_list).await?;
    if audio_ids.is_empty() && video_ids.is_empty() {
        info!(
            "no collections configured; paste playlist links into {} (audio) or {} (video)",
            cli.audio_list.display(),
            cli.video_list.display()
        );
        return Ok(());
    }

    let mut summaries = Vec::new();
    if !audio_ids.is_empty() {
        let root = cli
            .audio_dir
            .clone()
            .or_else(dirs::audio_dir)
            .unwrap_or_else(|| PathBuf::from("./playlists_audio"));
        let summary = sync_media(&cli, &tools, MediaKind::Audio, root, &audio_ids, &cancel).await?;
        summaries.push(summary);
    }
    if !video_ids.is_empty() && !cancel.is_cancelled() {
        let root = cli
            .video_dir
            .clone()
            .or_else(dirs::video_dir)
            .unwrap_or_else(|| PathBuf::from("./playlists_video"));
        let summary = sync_media(&cli, &tools, MediaKind::Video, root, &video_ids, &cancel).await?;
        summaries.push(summary);
    }

    let item_failures: usize = summaries.iter().map(|s| s.item_failures).sum();
    let skipped: usize = summaries.iter().map(|s| s.collections_failed).sum();
    if item_failures > 0 || skipped > 0 {
        warn!(item_failures, skipped_collections = skipped, "finished with failures");
    }
    Ok(())
}

/// Sync one media kind's collections into its output root. Errors returned
/// here are structural (unwritable root, invalid config) and fatal.
async fn sync_media(
    cli: &Cli,
    tools: &bootstrap::ExternalTools,
    media: MediaKind,
    root: PathBuf,
    collection_ids: &[String],
    cancel: &CancellationToken,
) -> anyhow::Result<batch::BatchSummary> {
    let config = RunConfig::default()
        .with_output_root(&root)
        .with_media(media)
        .with_concurrency(cli.concurrency)
        .with_cookie_file(cli.cookies.clone());
    config.validate()?;

    tokio::fs::create_dir_all(&root)
        .await
        .with_context(|| format!("output root is not writable: {}", root.display()))?;

    let temp_dir = std::env::temp_dir().join("playsync");
    tokio::fs::create_dir_all(&temp_dir)
        .await
        .with_context(|| format!("temp dir is not writable: {}", temp_dir.display()))?;

    let provider = YoutubeSnapshotProvider::new()
        .with_binary(&tools.ytdlp)
        .with_cookie_file(config.cookie_file.clone());
    let backend = YoutubeFetchBackend::new(media, &temp_dir)
        .with_binary(&tools.ytdlp)
        .with_cookie_file(config.cookie_file.clone())
        .with_ffmpeg_location(tools.ffmpeg_location.clone());

    let engine = SyncEngine::new(
        Arc::new(provider),
        Arc::new(backend),
        Arc::new(LoftyTagReader::new()),
        EngineConfig {
            output_root: config.output_root.clone(),
            extension: media.extension().to_string(),
            fetch: FetchConfig {
                concurrency: config.concurrency,
                pause: config.fetch_pause,
            },
        },
    );

    info!(
        media = %media,
        root = %root.display(),
        collections = collection_ids.len(),
        "syncing collections"
    );
    Ok(batch::run_batch(&engine, collection_ids, cancel).await)
}
