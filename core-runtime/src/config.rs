//! Run configuration for the sync binary.

use crate::error::{Result, RuntimeError};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// What kind of media a collection is synced as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaKind {
    #[default]
    Audio,
    Video,
}

impl MediaKind {
    /// Extension of files the fetch backend produces for this kind.
    pub fn extension(&self) -> &'static str {
        match self {
            MediaKind::Audio => "mp3",
            MediaKind::Video => "mp4",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
        }
    }
}

impl FromStr for MediaKind {
    type Err = RuntimeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "audio" => Ok(MediaKind::Audio),
            "video" => Ok(MediaKind::Video),
            _ => Err(RuntimeError::Config(format!("invalid media kind: {s}"))),
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Settings for one batch of collections synced into one output root.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Root directory receiving the collections
    pub output_root: PathBuf,
    pub media: MediaKind,
    /// Fetch worker-pool width; small by default to stay under upstream
    /// rate limits
    pub concurrency: usize,
    /// Pause after every fetch attempt
    pub fetch_pause: Duration,
    /// Cookie file granting access to private collections
    pub cookie_file: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("."),
            media: MediaKind::Audio,
            concurrency: 2,
            fetch_pause: Duration::from_secs(3),
            cookie_file: None,
        }
    }
}

impl RunConfig {
    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }

    pub fn with_media(mut self, media: MediaKind) -> Self {
        self.media = media;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_cookie_file(mut self, path: Option<PathBuf>) -> Self {
        self.cookie_file = path;
        self
    }

    /// Fail fast on settings that would make the whole run undefined.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(RuntimeError::Config(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if let Some(cookie) = &self.cookie_file {
            if !cookie.is_file() {
                return Err(RuntimeError::Config(format!(
                    "cookie file not found: {}",
                    cookie.display()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_kind_maps_to_extension() {
        assert_eq!(MediaKind::Audio.extension(), "mp3");
        assert_eq!(MediaKind::Video.extension(), "mp4");
        assert_eq!("video".parse::<MediaKind>().unwrap(), MediaKind::Video);
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let config = RunConfig::default().with_concurrency(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_cookie_file_is_rejected() {
        let config = RunConfig::default().with_cookie_file(Some("/no/such/cookies.txt".into()));
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_config_validates() {
        assert!(RunConfig::default().validate().is_ok());
    }
}
