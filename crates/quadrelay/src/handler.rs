//! Per-connection handler: upgrade, join, read loop, and teardown.
//!
//! Each accepted socket gets two Tokio tasks:
//!   1. the handler (this module's entry point), which completes the
//!      WebSocket upgrade, seats the connection, reads inbound frames,
//!      and hands them to the hub
//!   2. a writer that drains the connection's outbound queue onto the
//!      socket, so fan-out from other tasks never waits on this peer
//!
//! The handler stops reading as soon as the connection's handle is
//! closed, whether by the peer, by a failed write, or by a `CloseRoom`
//! from another member.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use quadrelay_protocol::Codec;
use quadrelay_room::{ConnectionHandle, Outbound, OutboundReceiver};
use quadrelay_session::{Dispatch, Session, SessionError, SessionHub};
use quadrelay_transport::{Connection, Incoming, WebSocketConnection, WebSocketIncoming};

/// Drop guard that releases a session's seat when the handler exits.
///
/// The normal path calls [`release`](Self::release). If the handler task
/// panics or is aborted first, `Drop` spawns the same cleanup, since
/// `Drop` can't await the hub's lock.
struct SessionGuard<C: Codec> {
    hub: Arc<SessionHub<C>>,
    session: Option<Session>,
}

impl<C: Codec> SessionGuard<C> {
    fn session(&mut self) -> Option<&mut Session> {
        self.session.as_mut()
    }

    async fn release(mut self) {
        if let Some(mut session) = self.session.take() {
            self.hub.leave(&mut session).await;
        }
    }
}

impl<C: Codec> Drop for SessionGuard<C> {
    fn drop(&mut self) {
        if let Some(mut session) = self.session.take() {
            let hub = Arc::clone(&self.hub);
            tokio::spawn(async move {
                hub.leave(&mut session).await;
            });
        }
    }
}

/// Handles a single connection from accept to close.
///
/// The upgrade runs here rather than in the accept loop, so a peer that
/// stalls its handshake only holds up its own task.
pub(crate) async fn handle_connection<C: Codec>(
    incoming: WebSocketIncoming,
    hub: Arc<SessionHub<C>>,
    send_timeout: Duration,
) {
    let peer = incoming.peer_addr();
    let conn = match incoming.establish().await {
        Ok(conn) => Arc::new(conn),
        Err(e) => {
            tracing::debug!(%peer, error = %e, "handshake failed");
            return;
        }
    };
    let conn_id = conn.id();
    tracing::debug!(%conn_id, %peer, "handling new connection");

    let (handle, outbound) = ConnectionHandle::new(conn_id);
    let writer = tokio::spawn(write_outbound(
        Arc::clone(&conn),
        handle.clone(),
        outbound,
        send_timeout,
    ));

    let session = hub.join(handle.clone()).await;
    let mut guard = SessionGuard {
        hub: Arc::clone(&hub),
        session: Some(session),
    };

    if let Some(session) = guard.session() {
        read_inbound(&conn, &hub, &handle, session).await;
    }

    // Leaving closes the handle, which queues the writer's final Close.
    guard.release().await;
    if let Err(e) = writer.await {
        tracing::debug!(%conn_id, error = %e, "writer task failed");
    }
}

/// Reads frames until the peer goes away or the session ends.
async fn read_inbound<C: Codec>(
    conn: &WebSocketConnection,
    hub: &SessionHub<C>,
    handle: &ConnectionHandle,
    session: &mut Session,
) {
    let conn_id = conn.id();
    let room_id = session.room_id().clone();
    let player_id = session.player_id();

    loop {
        let data = tokio::select! {
            biased;
            () = handle.closed() => {
                tracing::debug!(%conn_id, %room_id, %player_id, "connection closed locally");
                break;
            }
            received = conn.recv() => match received {
                Ok(Some(data)) => data,
                Ok(None) => {
                    tracing::info!(%conn_id, %room_id, %player_id, "connection closed by peer");
                    break;
                }
                Err(e) => {
                    tracing::debug!(%conn_id, %player_id, error = %e, "recv error");
                    break;
                }
            },
        };

        match hub.receive(session, Bytes::from(data)).await {
            Ok(Dispatch::Relayed(_)) => {}
            Ok(Dispatch::RoomClosed) => break,
            Err(SessionError::Malformed(e)) => {
                tracing::debug!(%conn_id, %player_id, error = %e, "dropped inbound message");
            }
            Err(SessionError::Closed(_)) => break,
        }
    }
}

/// Drains `outbound` onto the socket until a `Close` item or a failure.
async fn write_outbound(
    conn: Arc<WebSocketConnection>,
    handle: ConnectionHandle,
    mut outbound: OutboundReceiver,
    send_timeout: Duration,
) {
    let conn_id = conn.id();

    while let Some(item) = outbound.recv().await {
        let frame = match item {
            Outbound::Frame(frame) => frame,
            Outbound::Close => break,
        };
        match tokio::time::timeout(send_timeout, conn.send(&frame)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(%conn_id, error = %e, "send failed, dropping peer");
                handle.close();
                break;
            }
            Err(_) => {
                tracing::warn!(%conn_id, ?send_timeout, "send timed out, dropping peer");
                handle.close();
                break;
            }
        }
    }

    if tokio::time::timeout(send_timeout, conn.close()).await.is_err() {
        tracing::debug!(%conn_id, "close handshake timed out");
    }
}
