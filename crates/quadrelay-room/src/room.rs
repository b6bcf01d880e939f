//! A single room: an ordered, bounded list of seated participants.

use bytes::Bytes;
use quadrelay_protocol::{PlayerId, RoomId};
use quadrelay_transport::ConnectionId;

use crate::ConnectionHandle;

/// One connection's seat in a room.
#[derive(Debug, Clone)]
pub struct Participant {
    player_id: PlayerId,
    handle: ConnectionHandle,
}

impl Participant {
    /// The participant's seat number within its room.
    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    /// The participant's connection.
    pub fn handle(&self) -> &ConnectionHandle {
        &self.handle
    }
}

/// A snapshot of room metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    /// The room's token.
    pub room_id: RoomId,
    /// Seats in join order.
    pub players: Vec<PlayerId>,
    /// Maximum number of seats.
    pub capacity: usize,
}

/// An open room.
///
/// Members are kept in join order. Seat numbers are the smallest
/// non-negative integers not currently taken, so a seat vacated by a
/// departure is handed to the next arrival.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    capacity: usize,
    members: Vec<Participant>,
}

impl Room {
    pub(crate) fn new(id: RoomId, capacity: usize) -> Self {
        Self {
            id,
            capacity,
            members: Vec::with_capacity(capacity),
        }
    }

    /// Returns the room's token.
    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// Members in join order.
    pub fn members(&self) -> &[Participant] {
        &self.members
    }

    /// Number of seated members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if nobody is seated.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns `true` once every seat is taken.
    pub fn is_full(&self) -> bool {
        self.members.len() >= self.capacity
    }

    /// Seat numbers in join order.
    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.members.iter().map(Participant::player_id).collect()
    }

    /// Finds the participant using `conn`.
    pub fn participant(&self, conn: ConnectionId) -> Option<&Participant> {
        self.members.iter().find(|p| p.handle.id() == conn)
    }

    /// Returns a metadata snapshot.
    pub fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.id.clone(),
            players: self.player_ids(),
            capacity: self.capacity,
        }
    }

    /// Delivers `frame` to every open member in join order, skipping the
    /// member on `exclude` if given. Returns how many members accepted it.
    pub fn broadcast(&self, frame: &Bytes, exclude: Option<ConnectionId>) -> usize {
        let mut delivered = 0;
        for participant in &self.members {
            if Some(participant.handle.id()) == exclude {
                continue;
            }
            // `send` refuses closed handles, which is the skip rule.
            if participant.handle.send(frame.clone()) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Seats `handle` in the lowest free seat. Returns `None` when full.
    pub(crate) fn seat(&mut self, handle: ConnectionHandle) -> Option<PlayerId> {
        if self.is_full() {
            return None;
        }
        let player_id = self.lowest_free_seat()?;
        self.members.push(Participant { player_id, handle });
        Some(player_id)
    }

    /// Removes the participant using `conn`, preserving everyone else's
    /// order.
    pub(crate) fn unseat(&mut self, conn: ConnectionId) -> Option<Participant> {
        let index = self.members.iter().position(|p| p.handle.id() == conn)?;
        Some(self.members.remove(index))
    }

    /// Closes every member's connection.
    pub(crate) fn close_all(&self) {
        for participant in &self.members {
            participant.handle.close();
        }
    }

    fn lowest_free_seat(&self) -> Option<PlayerId> {
        (0..=u8::MAX)
            .map(PlayerId)
            .find(|id| self.members.iter().all(|p| p.player_id != *id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Outbound, OutboundReceiver};

    fn handle(id: u64) -> (ConnectionHandle, OutboundReceiver) {
        ConnectionHandle::new(ConnectionId::new(id))
    }

    fn room() -> Room {
        Room::new(RoomId::new("test01"), 4)
    }

    #[test]
    fn test_seat_assigns_sequential_ids_until_full() {
        let mut room = room();
        let mut rxs = Vec::new();
        for i in 0..4u64 {
            let (h, rx) = handle(i);
            rxs.push(rx);
            assert_eq!(room.seat(h), Some(PlayerId(i as u8)));
        }
        assert!(room.is_full());
        let (h, _rx) = handle(9);
        assert_eq!(room.seat(h), None);
        assert_eq!(room.len(), 4);
    }

    #[test]
    fn test_seat_reuses_lowest_vacated_seat() {
        let mut room = room();
        let (h0, _r0) = handle(0);
        let (h1, _r1) = handle(1);
        let (h2, _r2) = handle(2);
        room.seat(h0);
        room.seat(h1);
        room.seat(h2);

        let left = room.unseat(ConnectionId::new(1)).unwrap();
        assert_eq!(left.player_id(), PlayerId(1));

        let (h3, _r3) = handle(3);
        assert_eq!(room.seat(h3), Some(PlayerId(1)));
        // Join order is kept even though the seat number was recycled.
        assert_eq!(
            room.player_ids(),
            vec![PlayerId(0), PlayerId(2), PlayerId(1)]
        );
    }

    #[test]
    fn test_unseat_unknown_connection_is_none() {
        let mut room = room();
        assert!(room.unseat(ConnectionId::new(5)).is_none());
    }

    #[test]
    fn test_broadcast_excludes_sender_and_skips_closed() {
        let mut room = room();
        let (h0, mut r0) = handle(0);
        let (h1, mut r1) = handle(1);
        let (h2, mut r2) = handle(2);
        room.seat(h0);
        room.seat(h1);
        room.seat(h2.clone());
        h2.close();
        let _ = r2.try_recv(); // the Close marker

        let delivered = room.broadcast(&Bytes::from_static(b"m"), Some(ConnectionId::new(0)));

        assert_eq!(delivered, 1);
        assert!(r0.try_recv().is_err());
        assert_eq!(r1.try_recv().unwrap(), Outbound::Frame(Bytes::from_static(b"m")));
        assert!(r2.try_recv().is_err());
    }

    #[test]
    fn test_info_reports_join_order_and_capacity() {
        let mut room = room();
        let (h0, _r0) = handle(10);
        room.seat(h0);
        let info = room.info();
        assert_eq!(info.room_id, RoomId::new("test01"));
        assert_eq!(info.players, vec![PlayerId(0)]);
        assert_eq!(info.capacity, 4);
        assert!(room.participant(ConnectionId::new(10)).is_some());
    }
}
