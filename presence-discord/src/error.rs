use thiserror::Error;

#[derive(Error, Debug)]
pub enum PresenceError {
    #[error("no Discord IPC socket found")]
    SocketUnavailable,

    #[error("IPC I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("IPC protocol error: {0}")]
    Protocol(String),
}

pub type Result<T> = std::result::Result<T, PresenceError>;
