//! # Runtime Support
//!
//! Process-level concerns shared by the sync binary and the presence
//! reporter: structured logging setup, run configuration, and loading of
//! collection-id list files.

pub mod collections;
pub mod config;
pub mod error;
pub mod logging;

pub use collections::load_collection_list;
pub use config::{MediaKind, RunConfig};
pub use error::{Result, RuntimeError};
pub use logging::{init_logging, LogFormat, LoggingConfig};
