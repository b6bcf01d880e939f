//! Room registry: creates, tracks, and routes connections to rooms.

use std::collections::HashMap;

use bytes::Bytes;
use quadrelay_protocol::{PlayerId, RoomId};
use quadrelay_transport::ConnectionId;
use rand::Rng;

use crate::{ConnectionHandle, Room, RoomConfig, RoomInfo};

/// Characters used in generated room tokens.
const ROOM_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Shortest room token the registry will generate.
const MIN_ROOM_ID_LEN: usize = 4;

/// Where a connection sits: its room and its seat number there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    /// The room the connection belongs to.
    pub room_id: RoomId,
    /// The connection's seat within that room.
    pub player_id: PlayerId,
}

/// Result of [`RoomRegistry::assign`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// The seat the connection was given.
    pub seat: Seat,
    /// `true` if a new room was opened for this connection.
    pub created: bool,
}

/// Result of [`RoomRegistry::remove`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    /// The seat that was vacated.
    pub seat: Seat,
    /// Members left in the room afterwards.
    pub remaining: usize,
}

impl Departure {
    /// Returns `true` if the departure emptied, and so deleted, the room.
    pub fn room_removed(&self) -> bool {
        self.remaining == 0
    }
}

/// Every open room, plus an index from connection to seat.
///
/// Invariants kept by every method:
///
/// - no registered room is empty
/// - no room holds more than `capacity` members
/// - `seats` has exactly one entry per seated connection, and it agrees
///   with that room's member list
///
/// `RoomRegistry` is not synchronised; share it behind a lock.
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: HashMap<RoomId, Room>,
    /// Room tokens in creation order; first-fit scans follow it.
    order: Vec<RoomId>,
    seats: HashMap<ConnectionId, Seat>,
    capacity: usize,
    room_id_len: usize,
}

impl RoomRegistry {
    /// Creates an empty registry.
    pub fn new(config: &RoomConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            order: Vec::new(),
            seats: HashMap::new(),
            capacity: usize::from(config.capacity.max(1)),
            room_id_len: config.room_id_len.max(MIN_ROOM_ID_LEN),
        }
    }

    /// Seats `handle` in the oldest room with a free seat, or opens a new
    /// room for it.
    ///
    /// Never fails. A connection that is already seated keeps its seat.
    pub fn assign(&mut self, handle: ConnectionHandle) -> Assignment {
        let conn = handle.id();
        if let Some(seat) = self.seats.get(&conn) {
            tracing::warn!(%conn, room_id = %seat.room_id, "connection already seated");
            return Assignment {
                seat: seat.clone(),
                created: false,
            };
        }

        let open = self
            .order
            .iter()
            .find(|id| self.rooms.get(*id).is_some_and(|room| !room.is_full()))
            .cloned();

        if let Some(room_id) = open {
            if let Some(player_id) = self
                .rooms
                .get_mut(&room_id)
                .and_then(|room| room.seat(handle.clone()))
            {
                let seat = Seat { room_id, player_id };
                self.seats.insert(conn, seat.clone());
                return Assignment {
                    seat,
                    created: false,
                };
            }
        }

        let room_id = self.generate_room_id();
        let mut room = Room::new(room_id.clone(), self.capacity);
        // A fresh room always has seat 0 free.
        let player_id = room.seat(handle).unwrap_or(PlayerId(0));
        self.rooms.insert(room_id.clone(), room);
        self.order.push(room_id.clone());
        tracing::info!(%room_id, "room created");

        let seat = Seat { room_id, player_id };
        self.seats.insert(conn, seat.clone());
        Assignment {
            seat,
            created: true,
        }
    }

    /// Removes `conn` from its room, deleting the room if that empties it.
    ///
    /// Returns `None` if the connection isn't seated anywhere, e.g. because
    /// its room was already closed.
    pub fn remove(&mut self, conn: ConnectionId) -> Option<Departure> {
        let seat = self.seats.remove(&conn)?;
        let room = self.rooms.get_mut(&seat.room_id)?;
        room.unseat(conn)?;
        let remaining = room.len();
        if remaining == 0 {
            self.delete(&seat.room_id);
        }
        Some(Departure { seat, remaining })
    }

    /// Closes every member's connection and deletes the room.
    ///
    /// Returns the removed room, or `None` if it was already gone.
    pub fn close_room(&mut self, room_id: &RoomId) -> Option<Room> {
        let room = self.delete(room_id)?;
        for participant in room.members() {
            self.seats.remove(&participant.handle().id());
        }
        room.close_all();
        Some(room)
    }

    /// Delivers `frame` to the open members of `room_id`, optionally
    /// skipping one connection. A missing room is a no-op.
    ///
    /// Returns how many members accepted the frame.
    pub fn broadcast(
        &self,
        room_id: &RoomId,
        frame: &Bytes,
        exclude: Option<ConnectionId>,
    ) -> usize {
        self.rooms
            .get(room_id)
            .map_or(0, |room| room.broadcast(frame, exclude))
    }

    /// Returns the seat held by `conn`, if any.
    pub fn seat_of(&self, conn: ConnectionId) -> Option<&Seat> {
        self.seats.get(&conn)
    }

    /// Returns the room named `room_id`, if open.
    pub fn room(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    /// Returns a metadata snapshot of `room_id`, if open.
    pub fn info(&self, room_id: &RoomId) -> Option<RoomInfo> {
        self.rooms.get(room_id).map(Room::info)
    }

    /// Number of open rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Open room tokens, oldest first.
    pub fn room_ids(&self) -> Vec<RoomId> {
        self.order.clone()
    }

    /// Number of seated connections across all rooms.
    pub fn player_count(&self) -> usize {
        self.seats.len()
    }

    fn delete(&mut self, room_id: &RoomId) -> Option<Room> {
        let room = self.rooms.remove(room_id)?;
        self.order.retain(|id| id != room_id);
        tracing::info!(%room_id, "room destroyed");
        Some(room)
    }

    /// Draws tokens until one doesn't name an open room.
    fn generate_room_id(&self) -> RoomId {
        let mut rng = rand::rng();
        loop {
            let token: String = (0..self.room_id_len)
                .map(|_| {
                    let i = rng.random_range(0..ROOM_ID_ALPHABET.len());
                    char::from(ROOM_ID_ALPHABET[i])
                })
                .collect();
            let room_id = RoomId::new(token);
            if !self.rooms.contains_key(&room_id) {
                return room_id;
            }
            tracing::debug!(%room_id, "room token collision, regenerating");
        }
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(&RoomConfig::default())
    }
}
