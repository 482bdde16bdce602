//! Discord rich-presence reporting
//!
//! Watches for a known media player playing a synced file and mirrors the
//! track into a Discord "listening" activity. Entirely optional glue: no
//! failure in here ever affects a sync run.
//!
//! - Player discovery walks the process table (`sysinfo`) for known player
//!   binaries and inspects their open files for synced media.
//! - Track metadata comes from the file's embedded tags (`core-tags`) and
//!   the collection side-file written by the sync engine.
//! - The Discord connection is the local IPC socket, length-framed JSON.

pub mod error;
pub mod players;
pub mod watch;

#[cfg(unix)]
pub mod ipc;
#[cfg(unix)]
pub mod reporter;

pub use error::PresenceError;
pub use players::{lookup_player, PlayerInfo};
pub use watch::{NowPlaying, PlayerWatcher};

#[cfg(unix)]
pub use reporter::PresenceReporter;

/// Application id the activity is published under.
pub const DEFAULT_CLIENT_ID: &str = "1287237467400962109";
