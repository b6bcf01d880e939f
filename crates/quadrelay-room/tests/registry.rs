//! Integration tests for room assignment, fan-out, and teardown.
//!
//! Connections are in-memory `ConnectionHandle`s; each test keeps the
//! receiving side of every queue so it can see exactly what was delivered.

use std::collections::HashSet;

use bytes::Bytes;
use quadrelay_protocol::{PlayerId, RoomId};
use quadrelay_room::{
    ConnectionHandle, Outbound, OutboundReceiver, RoomConfig, RoomRegistry,
};
use quadrelay_transport::ConnectionId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// =========================================================================
// Helpers
// =========================================================================

fn cid(id: u64) -> ConnectionId {
    ConnectionId::new(id)
}

fn handle(id: u64) -> (ConnectionHandle, OutboundReceiver) {
    ConnectionHandle::new(cid(id))
}

/// Drains everything currently queued for one connection.
fn drain(rx: &mut OutboundReceiver) -> Vec<Outbound> {
    let mut out = Vec::new();
    while let Ok(item) = rx.try_recv() {
        out.push(item);
    }
    out
}

fn frame(data: &'static [u8]) -> Outbound {
    Outbound::Frame(Bytes::from_static(data))
}

/// Checks every structural invariant the registry promises.
fn assert_invariants(registry: &RoomRegistry, capacity: usize) {
    for room_id in registry.room_ids() {
        let room = registry.room(&room_id).expect("listed room must exist");
        assert!(!room.is_empty(), "empty room {room_id} still registered");
        assert!(room.len() <= capacity, "room {room_id} over capacity");

        let ids = room.player_ids();
        let unique: HashSet<_> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len(), "duplicate seat in {room_id}");

        for participant in room.members() {
            let seat = registry
                .seat_of(participant.handle().id())
                .expect("member missing from seat index");
            assert_eq!(seat.room_id, room_id);
            assert_eq!(seat.player_id, participant.player_id());
        }
    }
}

// =========================================================================
// Assignment
// =========================================================================

#[test]
fn test_assign_first_four_share_one_room() {
    let mut registry = RoomRegistry::default();
    let mut rxs = Vec::new();
    let mut room_ids = HashSet::new();

    for i in 0..4 {
        let (h, rx) = handle(i);
        rxs.push(rx);
        let a = registry.assign(h);
        assert_eq!(a.seat.player_id, PlayerId(i as u8));
        assert_eq!(a.created, i == 0);
        room_ids.insert(a.seat.room_id);
    }

    assert_eq!(room_ids.len(), 1);
    assert_eq!(registry.room_count(), 1);
    let room_id = room_ids.into_iter().next().unwrap();
    assert!(registry.room(&room_id).unwrap().is_full());
}

#[test]
fn test_assign_fifth_opens_new_room_at_seat_zero() {
    let mut registry = RoomRegistry::default();
    let mut rxs = Vec::new();
    let mut first_room = None;
    for i in 0..4 {
        let (h, rx) = handle(i);
        rxs.push(rx);
        first_room = Some(registry.assign(h).seat.room_id);
    }

    let (h, _rx) = handle(4);
    let fifth = registry.assign(h);

    assert!(fifth.created);
    assert_eq!(fifth.seat.player_id, PlayerId(0));
    assert_ne!(Some(fifth.seat.room_id.clone()), first_room);
    assert_eq!(registry.room(&fifth.seat.room_id).unwrap().len(), 1);
    assert_eq!(registry.room_count(), 2);
}

#[test]
fn test_assign_prefers_oldest_room_with_free_seat() {
    let mut registry = RoomRegistry::default();
    let mut rxs = Vec::new();
    let mut rooms = Vec::new();
    for i in 0..5 {
        let (h, rx) = handle(i);
        rxs.push(rx);
        rooms.push(registry.assign(h).seat.room_id);
    }
    let first = rooms[0].clone();
    let second = rooms[4].clone();

    // Free a seat in the first (oldest) room.
    registry.remove(cid(2)).unwrap();

    let (h, _rx) = handle(10);
    let a = registry.assign(h);
    assert_eq!(a.seat.room_id, first);
    assert_eq!(a.seat.player_id, PlayerId(2), "vacated seat is reused");
    assert_eq!(registry.room(&second).unwrap().len(), 1);
}

#[test]
fn test_room_ids_are_unique_across_many_rooms() {
    let mut registry = RoomRegistry::new(&RoomConfig {
        capacity: 1,
        ..RoomConfig::default()
    });
    let mut rxs = Vec::new();
    let mut seen = HashSet::new();
    for i in 0..500 {
        let (h, rx) = handle(i);
        rxs.push(rx);
        let a = registry.assign(h);
        assert!(seen.insert(a.seat.room_id), "room id reused while open");
    }
    assert_eq!(registry.room_count(), 500);
}

// =========================================================================
// Broadcast
// =========================================================================

#[test]
fn test_broadcast_all_reaches_every_member_in_order() {
    let mut registry = RoomRegistry::default();
    let mut rxs = Vec::new();
    let mut room_id = None;
    for i in 0..3 {
        let (h, rx) = handle(i);
        rxs.push(rx);
        room_id = Some(registry.assign(h).seat.room_id);
    }
    let room_id = room_id.unwrap();

    let sent = registry.broadcast(&room_id, &Bytes::from_static(b"a"), None);
    registry.broadcast(&room_id, &Bytes::from_static(b"b"), None);

    assert_eq!(sent, 3);
    for rx in &mut rxs {
        assert_eq!(drain(rx), vec![frame(b"a"), frame(b"b")]);
    }
}

#[test]
fn test_broadcast_exclude_never_reaches_sender() {
    let mut registry = RoomRegistry::default();
    let mut rxs = Vec::new();
    let mut room_id = None;
    for i in 0..4 {
        let (h, rx) = handle(i);
        rxs.push(rx);
        room_id = Some(registry.assign(h).seat.room_id);
    }
    let room_id = room_id.unwrap();

    for sender in 0..4u64 {
        let sent = registry.broadcast(
            &room_id,
            &Bytes::from_static(b"x"),
            Some(cid(sender)),
        );
        assert_eq!(sent, 3);
        assert!(drain(&mut rxs[sender as usize]).is_empty());
        for (i, rx) in rxs.iter_mut().enumerate() {
            if i as u64 != sender {
                assert_eq!(drain(rx), vec![frame(b"x")]);
            }
        }
    }
}

#[test]
fn test_broadcast_skips_closed_connection_silently() {
    let mut registry = RoomRegistry::default();
    let (h0, mut r0) = handle(0);
    let (h1, r1) = handle(1);
    let room_id = registry.assign(h0).seat.room_id;
    registry.assign(h1);
    drop(r1); // writer for connection 1 is gone

    let sent = registry.broadcast(&room_id, &Bytes::from_static(b"y"), None);
    assert_eq!(sent, 1);
    assert_eq!(drain(&mut r0), vec![frame(b"y")]);
}

#[test]
fn test_broadcast_to_missing_room_is_noop() {
    let registry = RoomRegistry::default();
    let sent = registry.broadcast(
        &RoomId::new("gone00"),
        &Bytes::from_static(b"z"),
        None,
    );
    assert_eq!(sent, 0);
}

// =========================================================================
// Removal and closure
// =========================================================================

#[test]
fn test_remove_last_member_deletes_room() {
    let mut registry = RoomRegistry::default();
    let (h, _rx) = handle(0);
    let room_id = registry.assign(h).seat.room_id;

    let departure = registry.remove(cid(0)).unwrap();

    assert!(departure.room_removed());
    assert_eq!(departure.seat.player_id, PlayerId(0));
    assert!(registry.room(&room_id).is_none());
    assert_eq!(registry.room_count(), 0);
    assert!(registry.room_ids().is_empty());
}

#[test]
fn test_remove_from_three_keeps_room() {
    let mut registry = RoomRegistry::default();
    let mut rxs = Vec::new();
    let mut room_id = None;
    for i in 0..3 {
        let (h, rx) = handle(i);
        rxs.push(rx);
        room_id = Some(registry.assign(h).seat.room_id);
    }
    let room_id = room_id.unwrap();

    let departure = registry.remove(cid(1)).unwrap();

    assert_eq!(departure.remaining, 2);
    assert!(!departure.room_removed());
    assert_eq!(
        registry.room(&room_id).unwrap().player_ids(),
        vec![PlayerId(0), PlayerId(2)]
    );
}

#[test]
fn test_remove_unknown_connection_is_none() {
    let mut registry = RoomRegistry::default();
    assert!(registry.remove(cid(99)).is_none());
}

#[test]
fn test_close_room_closes_all_and_unregisters() {
    let mut registry = RoomRegistry::default();
    let mut handles = Vec::new();
    let mut rxs = Vec::new();
    let mut room_id = None;
    for i in 0..4 {
        let (h, rx) = handle(i);
        handles.push(h.clone());
        rxs.push(rx);
        room_id = Some(registry.assign(h).seat.room_id);
    }
    let room_id = room_id.unwrap();

    let closed = registry.close_room(&room_id).expect("room was open");

    assert_eq!(closed.len(), 4);
    assert!(registry.room(&room_id).is_none());
    assert_eq!(registry.player_count(), 0);
    for (h, rx) in handles.iter().zip(rxs.iter_mut()) {
        assert!(!h.is_open());
        assert_eq!(drain(rx), vec![Outbound::Close]);
    }
}

#[test]
fn test_close_room_twice_is_noop() {
    let mut registry = RoomRegistry::default();
    let (h, mut rx) = handle(0);
    let room_id = registry.assign(h).seat.room_id;

    assert!(registry.close_room(&room_id).is_some());
    assert!(registry.close_room(&room_id).is_none());
    // A later transport-level disconnect finds nothing to do.
    assert!(registry.remove(cid(0)).is_none());
    assert_eq!(drain(&mut rx), vec![Outbound::Close]);
}

// =========================================================================
// Invariants under random churn
// =========================================================================

#[test]
fn test_invariants_hold_under_random_joins_and_leaves() {
    let capacity = 4;
    let mut registry = RoomRegistry::default();
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut live: Vec<(u64, OutboundReceiver)> = Vec::new();
    let mut next_id = 0u64;

    for _ in 0..2_000 {
        let roll: u8 = rng.random_range(0..10);
        if live.is_empty() || roll < 6 {
            let (h, rx) = handle(next_id);
            registry.assign(h);
            live.push((next_id, rx));
            next_id += 1;
        } else if roll < 9 {
            let idx = rng.random_range(0..live.len());
            let (id, _rx) = live.swap_remove(idx);
            assert!(registry.remove(cid(id)).is_some());
        } else {
            let idx = rng.random_range(0..live.len());
            let room_id = registry
                .seat_of(cid(live[idx].0))
                .map(|s| s.room_id.clone())
                .expect("live connection must be seated");
            let room = registry.close_room(&room_id).unwrap();
            let gone: HashSet<_> =
                room.members().iter().map(|p| p.handle().id()).collect();
            live.retain(|(id, _)| !gone.contains(&cid(*id)));
        }
        assert_invariants(&registry, capacity);
        assert_eq!(registry.player_count(), live.len());
    }
}
