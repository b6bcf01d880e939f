//! WebSocket transport implementation using `tokio-tungstenite`.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;

use crate::{Connection, ConnectionId, Incoming, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Default upper bound on the HTTP upgrade of a freshly accepted socket.
const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

type WsStream = tokio_tungstenite::WebSocketStream<TcpStream>;

/// A WebSocket-based [`Transport`] that listens for incoming connections.
pub struct WebSocketTransport {
    listener: TcpListener,
    handshake_timeout: Duration,
}

impl WebSocketTransport {
    /// Binds a new WebSocket transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind { addr: addr.to_string(), source })?;
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self { listener, handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT })
    }

    /// Sets how long an accepted socket gets to complete its upgrade.
    pub fn set_handshake_timeout(&mut self, timeout: Duration) {
        self.handshake_timeout = timeout;
    }
}

impl Transport for WebSocketTransport {
    type Incoming = WebSocketIncoming;
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Incoming, Self::Error> {
        // `TcpListener::accept` is cancel-safe; nothing else awaits here.
        let (stream, peer_addr) = self.listener.accept().await.map_err(TransportError::Accept)?;
        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%id, %peer_addr, "accepted TCP connection");
        Ok(WebSocketIncoming { id, peer_addr, stream, handshake_timeout: self.handshake_timeout })
    }

    fn local_addr(&self) -> Result<SocketAddr, Self::Error> {
        self.listener.local_addr().map_err(TransportError::Accept)
    }
}

/// An accepted TCP socket that hasn't upgraded to WebSocket yet.
pub struct WebSocketIncoming {
    id: ConnectionId,
    peer_addr: SocketAddr,
    stream: TcpStream,
    handshake_timeout: Duration,
}

impl WebSocketIncoming {
    /// The identifier the connection will carry once established.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Incoming for WebSocketIncoming {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    async fn establish(self) -> Result<Self::Connection, Self::Error> {
        let Self { id, peer_addr, stream, handshake_timeout } = self;

        let ws = tokio::time::timeout(handshake_timeout, tokio_tungstenite::accept_async(stream))
            .await
            .map_err(|_| TransportError::HandshakeTimedOut {
                peer: peer_addr,
                timeout: handshake_timeout,
            })?
            .map_err(|source| TransportError::Handshake { peer: peer_addr, source })?;

        tracing::debug!(%id, %peer_addr, "WebSocket upgrade complete");

        // Reads and writes get their own locks so a parked `recv` never
        // delays a `send` coming from another player's relay.
        let (sink, stream) = ws.split();
        Ok(WebSocketConnection {
            id,
            peer_addr,
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        })
    }
}

/// A single WebSocket connection.
pub struct WebSocketConnection {
    id: ConnectionId,
    peer_addr: SocketAddr,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
}

impl WebSocketConnection {
    /// Returns the remote peer's socket address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    /// Sends `data` as a text frame when it is valid UTF-8 (every JSON
    /// payload is), otherwise as a binary frame.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        let msg = match std::str::from_utf8(data) {
            Ok(text) => Message::Text(text.to_owned().into()),
            Err(_) => Message::Binary(data.to_vec().into()),
        };
        self.sink.lock().await.send(msg).await.map_err(TransportError::Send)
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        loop {
            let msg = self.stream.lock().await.next().await;
            match msg {
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(data.into()));
                }
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_bytes().to_vec()));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // skip ping/pong/frame
                Some(Err(e)) => return Err(TransportError::Receive(e)),
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.sink.lock().await.close().await.map_err(TransportError::Close)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
