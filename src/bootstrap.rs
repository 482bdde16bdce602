//! External binary probing.
//!
//! The extractor (`yt-dlp`) and post-processor (`ffmpeg`) are external
//! collaborators; all this module does is verify they can actually be
//! launched before any collection is touched. A missing binary is structural
//! misconfiguration, fatal to the whole run, with an actionable message.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// Resolved locations of the external tools.
#[derive(Debug, Clone)]
pub struct ExternalTools {
    pub ytdlp: PathBuf,
    /// Explicit ffmpeg location when it is not on `PATH`
    pub ffmpeg_location: Option<PathBuf>,
}

/// Check that a binary can be launched at all.
pub async fn probe(binary: &Path) -> bool {
    Command::new(binary)
        .arg("--version")
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Verify both tools are available, preferring `PATH` and falling back to
/// the app-local install directory for ffmpeg.
pub async fn ensure_tools(ytdlp_override: Option<PathBuf>) -> Result<ExternalTools> {
    let ytdlp = ytdlp_override.unwrap_or_else(|| PathBuf::from("yt-dlp"));
    if !probe(&ytdlp).await {
        bail!(
            "yt-dlp is not available ({}). Install it (e.g. `pip install yt-dlp` or your \
             package manager) or pass --ytdlp with its location.",
            ytdlp.display()
        );
    }
    debug!(binary = %ytdlp.display(), "extractor available");

    let ffmpeg_location = resolve_ffmpeg().await;
    match &ffmpeg_location {
        Some(Some(location)) => info!(location = %location.display(), "using local ffmpeg"),
        Some(None) => debug!("ffmpeg available on PATH"),
        None => bail!(
            "ffmpeg is not available. Install it via your package manager (it is required \
             for format conversion and metadata embedding)."
        ),
    }

    Ok(ExternalTools {
        ytdlp,
        ffmpeg_location: ffmpeg_location.flatten(),
    })
}

/// `Some(None)` = on PATH, `Some(Some(path))` = app-local install,
/// `None` = not found anywhere.
async fn resolve_ffmpeg() -> Option<Option<PathBuf>> {
    if probe(Path::new("ffmpeg")).await {
        return Some(None);
    }
    let local = dirs::data_local_dir()?.join("playsync").join("ffmpeg");
    let binary = local.join("ffmpeg");
    if probe(&binary).await {
        return Some(Some(local));
    }
    None
}
