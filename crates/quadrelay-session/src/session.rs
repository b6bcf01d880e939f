//! Per-connection session record.

use quadrelay_protocol::{PlayerId, RoomId};
use quadrelay_room::{ConnectionHandle, Seat};

/// Where a session is in its lifecycle.
///
/// `Joining` only exists inside [`SessionHub::join`](crate::SessionHub::join);
/// callers receive sessions that are already `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Being seated and announced.
    Joining,
    /// Seated; inbound messages are relayed.
    Active,
    /// Terminal. Reached on disconnect or when the room is closed.
    Closed,
}

/// One connection's session, owned by that connection's task.
#[derive(Debug)]
pub struct Session {
    pub(crate) handle: ConnectionHandle,
    pub(crate) seat: Seat,
    pub(crate) state: SessionState,
}

impl Session {
    /// The connection this session belongs to.
    pub fn handle(&self) -> &ConnectionHandle {
        &self.handle
    }

    /// The room the session was seated in.
    pub fn room_id(&self) -> &RoomId {
        &self.seat.room_id
    }

    /// The seat the session was given.
    pub fn player_id(&self) -> PlayerId {
        self.seat.player_id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns `true` while inbound messages are still being relayed.
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }
}
