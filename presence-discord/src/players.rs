//! Known media players.
//!
//! Matching is a case-insensitive substring check against the process name,
//! so "vlc" covers both `vlc` and `vlc.exe`.

/// Display data for one known player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerInfo {
    /// Substring matched against process names (lowercase)
    pub process: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
}

const PLAYERS: &[PlayerInfo] = &[
    PlayerInfo {
        process: "vlc",
        name: "VLC Player",
        icon: "https://cdn1.iconfinder.com/data/icons/metro-ui-dock-icon-set--icons-by-dakirby/512/VLC_Media_Player.png",
    },
    PlayerInfo {
        process: "mpv",
        name: "mpv",
        icon: "https://upload.wikimedia.org/wikipedia/commons/thumb/2/29/Mpv_logo_%28official%29.png/240px-Mpv_logo_%28official%29.png",
    },
    PlayerInfo {
        process: "audacious",
        name: "Audacious",
        icon: "https://upload.wikimedia.org/wikipedia/commons/d/dc/Audacious_Logo.png",
    },
    PlayerInfo {
        process: "rhythmbox",
        name: "Rhythmbox",
        icon: "https://upload.wikimedia.org/wikipedia/commons/a/a7/Rhythmbox_Icon.png",
    },
    PlayerInfo {
        process: "foobar2000",
        name: "foobar2000",
        icon: "https://i.sstatic.net/JowsQ.jpg",
    },
    PlayerInfo {
        process: "musicbee",
        name: "MusicBee",
        icon: "https://iili.io/dsf9KQe.png",
    },
    PlayerInfo {
        process: "potplayermini",
        name: "Daum PotPlayer",
        icon: "https://upload.wikimedia.org/wikipedia/commons/e/e0/PotPlayer_logo_%282017%29.png",
    },
    PlayerInfo {
        process: "mpc-hc",
        name: "Media Player Classic HC",
        icon: "https://upload.wikimedia.org/wikipedia/commons/7/76/Media_Player_Classic_logo.png",
    },
];

/// Look up a known player by process name.
pub fn lookup_player(process_name: &str) -> Option<&'static PlayerInfo> {
    let lowered = process_name.to_lowercase();
    PLAYERS.iter().find(|p| lowered.contains(p.process))
}
