//! Room configuration.

use serde::{Deserialize, Serialize};

/// Configuration shared by every room in a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Seats per room. A room that reaches this size announces
    /// `GameReady`. Values below 1 are treated as 1.
    pub capacity: u8,

    /// When a departure leaves exactly one member behind, also send that
    /// member a `PlayerAlone` notice after the usual `PlayerDisconnected`.
    pub lone_player_notice: bool,

    /// Length of generated room tokens. Values below 4 are raised to 4.
    pub room_id_len: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            capacity: 4,
            lone_player_notice: false,
            room_id_len: 6,
        }
    }
}
