use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("failed to launch {binary}: {source}")]
    Launch {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("invalid extractor output: {0}")]
    InvalidOutput(String),

    #[error("download failed: {0}")]
    Download(String),
}

pub type Result<T> = std::result::Result<T, ProviderError>;
