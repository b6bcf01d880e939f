//! The session hub: join, relay, close-room, and leave orchestration.

use bytes::Bytes;
use quadrelay_protocol::{ClientMessage, Codec, Notice, PlayerId, RoomId, ServerMessage};
use quadrelay_room::{ConnectionHandle, Departure, RoomConfig, RoomInfo, RoomRegistry};
use tokio::sync::Mutex;

use crate::{Session, SessionError, SessionState};

/// What happened to an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Relayed verbatim to this many other members.
    Relayed(usize),
    /// The sender asked to close the room; every member's session is over.
    RoomClosed,
}

/// Shared entry point for every connection task.
///
/// The registry sits behind one lock. Each operation takes the lock once
/// and does its membership change and its fan-out before releasing it,
/// so join, leave, and close on a room are serialised and every member
/// sees notifications in membership order. Fan-out only enqueues onto
/// per-connection queues, so holding the lock never waits on a socket.
pub struct SessionHub<C: Codec> {
    registry: Mutex<RoomRegistry>,
    codec: C,
    lone_player_notice: bool,
}

impl<C: Codec> SessionHub<C> {
    /// Creates a hub with an empty registry.
    pub fn new(config: &RoomConfig, codec: C) -> Self {
        Self {
            registry: Mutex::new(RoomRegistry::new(config)),
            codec,
            lone_player_notice: config.lone_player_notice,
        }
    }

    /// Seats a new connection and announces it.
    ///
    /// The newcomer receives `PlayerId` then `AllPlayerIds`; the whole
    /// room, newcomer included, then receives `PlayerJoined`, followed by
    /// `Message: GameReady` if this join filled the room.
    pub async fn join(&self, handle: ConnectionHandle) -> Session {
        let mut registry = self.registry.lock().await;
        let assignment = registry.assign(handle.clone());
        let mut session = Session {
            handle,
            seat: assignment.seat,
            state: SessionState::Joining,
        };
        let room_id = session.room_id().clone();
        let player_id = session.player_id();

        self.send_to(&session.handle, &ServerMessage::PlayerId(player_id));

        let (players, full) = registry
            .room(&room_id)
            .map(|room| (room.player_ids(), room.is_full()))
            .unwrap_or_default();
        self.send_to(
            &session.handle,
            &ServerMessage::AllPlayerIds(players.clone()),
        );
        self.broadcast(
            &registry,
            &room_id,
            &ServerMessage::PlayerJoined(player_id),
        );

        tracing::info!(
            %room_id,
            %player_id,
            conn = %session.handle.id(),
            players = players.len(),
            "player joined"
        );

        if full {
            self.broadcast(
                &registry,
                &room_id,
                &ServerMessage::Message(Notice::GameReady),
            );
            tracing::info!(%room_id, "room full, game ready");
        }

        session.state = SessionState::Active;
        session
    }

    /// Handles one inbound payload from `session`.
    ///
    /// `CloseRoom` tears the room down for everyone; any other record with
    /// a string `type` is relayed byte-for-byte to the other members.
    ///
    /// # Errors
    /// - [`SessionError::Malformed`]: the payload was dropped; the session
    ///   stays active
    /// - [`SessionError::Closed`]: the session (or its room) is already
    ///   closed; nothing was relayed
    pub async fn receive(
        &self,
        session: &mut Session,
        data: Bytes,
    ) -> Result<Dispatch, SessionError> {
        let conn = session.handle.id();
        if !session.is_active() {
            return Err(SessionError::Closed(conn));
        }

        let inbound: ClientMessage = self.codec.decode(&data)?;

        let mut registry = self.registry.lock().await;
        // The room may have been closed by another member since this
        // message was read; the index is the source of truth.
        if registry.seat_of(conn) != Some(&session.seat) {
            session.state = SessionState::Closed;
            return Err(SessionError::Closed(conn));
        }

        let room_id = session.room_id().clone();
        let player_id = session.player_id();

        match inbound {
            ClientMessage::CloseRoom => {
                self.broadcast(
                    &registry,
                    &room_id,
                    &ServerMessage::RoomClosed(Some(player_id)),
                );
                let closed = registry
                    .close_room(&room_id)
                    .map_or(0, |room| room.len());
                session.state = SessionState::Closed;
                tracing::info!(
                    %room_id,
                    %player_id,
                    players = closed,
                    "room closed by player"
                );
                Ok(Dispatch::RoomClosed)
            }
            ClientMessage::Relay { kind } => {
                let recipients =
                    registry.broadcast(&room_id, &data, Some(conn));
                tracing::debug!(
                    %room_id,
                    %player_id,
                    %kind,
                    recipients,
                    "relayed message"
                );
                Ok(Dispatch::Relayed(recipients))
            }
        }
    }

    /// Ends `session` after its connection went away.
    ///
    /// Vacates the seat, tells the remaining members with
    /// `PlayerDisconnected`, and deletes the room if it is now empty.
    /// Calling this for a session whose room was already closed, or a
    /// second time, does nothing and returns `None`.
    pub async fn leave(&self, session: &mut Session) -> Option<Departure> {
        session.state = SessionState::Closed;
        session.handle.close();

        let mut registry = self.registry.lock().await;
        let departure = registry.remove(session.handle.id())?;
        let room_id = departure.seat.room_id.clone();
        let player_id = departure.seat.player_id;

        tracing::info!(
            %room_id,
            %player_id,
            remaining = departure.remaining,
            "player left"
        );

        if departure.room_removed() {
            return Some(departure);
        }

        self.broadcast(
            &registry,
            &room_id,
            &ServerMessage::PlayerDisconnected(player_id),
        );

        if self.lone_player_notice && departure.remaining == 1 {
            if let Some(last) =
                registry.room(&room_id).and_then(|room| room.members().first())
            {
                self.send_to(
                    last.handle(),
                    &ServerMessage::PlayerAlone(last.player_id()),
                );
            }
        }

        Some(departure)
    }

    /// Closes every open room, telling members with `RoomClosed: null`.
    ///
    /// Returns how many rooms were closed.
    pub async fn close_all(&self) -> usize {
        let mut registry = self.registry.lock().await;
        let room_ids = registry.room_ids();
        for room_id in &room_ids {
            self.broadcast(
                &registry,
                room_id,
                &ServerMessage::RoomClosed(None),
            );
            registry.close_room(room_id);
        }
        if !room_ids.is_empty() {
            tracing::info!(rooms = room_ids.len(), "closed all rooms");
        }
        room_ids.len()
    }

    /// Returns a metadata snapshot of `room_id`, if open.
    pub async fn room_info(&self, room_id: &RoomId) -> Option<RoomInfo> {
        self.registry.lock().await.info(room_id)
    }

    /// Number of open rooms.
    pub async fn room_count(&self) -> usize {
        self.registry.lock().await.room_count()
    }

    /// Seats taken by `room_id`'s members, in join order.
    pub async fn players(&self, room_id: &RoomId) -> Vec<PlayerId> {
        self.room_info(room_id)
            .await
            .map(|info| info.players)
            .unwrap_or_default()
    }

    fn encode(&self, msg: &ServerMessage) -> Option<Bytes> {
        match self.codec.encode(msg) {
            Ok(bytes) => Some(Bytes::from(bytes)),
            Err(e) => {
                tracing::warn!(error = %e, ?msg, "failed to encode server message");
                None
            }
        }
    }

    fn send_to(&self, handle: &ConnectionHandle, msg: &ServerMessage) {
        if let Some(frame) = self.encode(msg) {
            handle.send(frame);
        }
    }

    fn broadcast(&self, registry: &RoomRegistry, room_id: &RoomId, msg: &ServerMessage) -> usize {
        self.encode(msg)
            .map_or(0, |frame| registry.broadcast(room_id, &frame, None))
    }
}
