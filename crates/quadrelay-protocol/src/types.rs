//! Core protocol types for Quadrelay's wire format.
//!
//! Every server→client record is adjacently tagged:
//!
//! ```text
//! { "type": "PlayerJoined", "data": 2 }
//! ```
//!
//! Client→server records only need a string `type`. The broker reacts to
//! `CloseRoom` and relays every other well-formed record untouched.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A player's seat within a room.
///
/// Seats are room-scoped and 0-based: a four-player room uses `0..=3`.
/// Two rooms can both have a `PlayerId(0)`; the pair `(RoomId, PlayerId)`
/// is what identifies a participant globally.
///
/// `#[serde(transparent)]` keeps the wire form a plain number, so
/// `PlayerId(2)` is just `2` in JSON.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u8);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A short opaque token naming an open room.
///
/// Only uniqueness among currently open rooms matters; the registry picks
/// the token and never reuses one that is still live.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Wraps an already generated token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Free-form notices carried by [`ServerMessage::Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notice {
    /// The room reached capacity; the game can begin.
    GameReady,
}

/// Messages the broker itself sends to clients.
///
/// `#[serde(tag = "type", content = "data")]` produces the
/// `{ "type": ..., "data": ... }` shape game clients switch on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    /// To a new client only: the seat it was given.
    PlayerId(PlayerId),

    /// To a new client only: every seat in the room, in join order,
    /// including its own.
    AllPlayerIds(Vec<PlayerId>),

    /// To the whole room, newcomer included: someone took a seat.
    PlayerJoined(PlayerId),

    /// To the whole room: a room-level notice such as `GameReady`.
    Message(Notice),

    /// To the whole room: the room is gone. Carries the seat of the
    /// player that asked for it, or `null` when the server closed it.
    RoomClosed(Option<PlayerId>),

    /// To the remaining members: a seat was vacated.
    PlayerDisconnected(PlayerId),

    /// To the last remaining member, when lone-player notices are on.
    PlayerAlone(PlayerId),
}

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// What the broker understands of an inbound client record.
///
/// Only the `type` tag is inspected; any other fields are ignored here and
/// preserved in the raw bytes that get relayed. A record without a string
/// `type` fails to decode and is dropped by the session layer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "TaggedRecord")]
pub enum ClientMessage {
    /// Tear the sender's room down for every member.
    CloseRoom,

    /// Any other type: opaque game traffic to relay to the other members.
    Relay {
        /// The client's `type` tag, kept for logging.
        kind: String,
    },
}

/// The minimal shape every inbound record must have. The tag is a plain
/// `String` so that numeric tags are rejected instead of being read as
/// variant indices.
#[derive(Deserialize)]
struct TaggedRecord {
    #[serde(rename = "type")]
    kind: String,
}

impl From<TaggedRecord> for ClientMessage {
    fn from(record: TaggedRecord) -> Self {
        match record.kind.as_str() {
            "CloseRoom" => Self::CloseRoom,
            _ => Self::Relay { kind: record.kind },
        }
    }
}
