//! Connection handles: how the room layer talks to a live connection.
//!
//! The room layer never writes to a socket. Each connection owns a writer
//! task that drains an unbounded queue; the handle is the sending side of
//! that queue plus a shared "closed" flag. Enqueueing never blocks, so a
//! slow peer can't stall a broadcast to the rest of its room.

use std::sync::Arc;

use bytes::Bytes;
use quadrelay_transport::ConnectionId;
use tokio::sync::{mpsc, watch};

/// Work items for a connection's writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Write this frame to the peer.
    Frame(Bytes),
    /// Close the connection. Nothing queued after this is written.
    Close,
}

/// Receiving side of a connection's outbound queue.
pub type OutboundReceiver = mpsc::UnboundedReceiver<Outbound>;

/// A cloneable handle to one live connection.
///
/// Clones share the same queue and closed flag. Once closed, a handle
/// stays closed.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    outbound: mpsc::UnboundedSender<Outbound>,
    closed: Arc<watch::Sender<bool>>,
}

impl ConnectionHandle {
    /// Creates a handle and the queue its writer task should drain.
    pub fn new(id: ConnectionId) -> (Self, OutboundReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (closed, _) = watch::channel(false);
        let handle = Self {
            id,
            outbound: tx,
            closed: Arc::new(closed),
        };
        (handle, rx)
    }

    /// Returns the identifier of the underlying connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns `true` until the handle is closed or its writer is gone.
    pub fn is_open(&self) -> bool {
        !*self.closed.borrow() && !self.outbound.is_closed()
    }

    /// Queues a frame for delivery. Returns `false`, without queueing,
    /// when the connection is no longer open.
    pub fn send(&self, frame: Bytes) -> bool {
        if !self.is_open() {
            return false;
        }
        self.outbound.send(Outbound::Frame(frame)).is_ok()
    }

    /// Closes the connection. Frames queued before the call are still
    /// written; later sends are refused. Idempotent.
    pub fn close(&self) {
        let was_closed = self.closed.send_replace(true);
        if !was_closed {
            let _ = self.outbound.send(Outbound::Close);
        }
    }

    /// Resolves once [`close`](Self::close) has been called on any clone.
    pub async fn closed(&self) {
        let mut rx = self.closed.subscribe();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}
