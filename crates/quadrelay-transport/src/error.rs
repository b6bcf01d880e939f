use std::net::SocketAddr;
use std::time::Duration;

#[cfg(feature = "websocket")]
use tokio_tungstenite::tungstenite;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The listener couldn't be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Taking a socket off the listener failed.
    #[error("accept failed: {0}")]
    Accept(#[source] std::io::Error),

    /// The peer didn't finish its handshake in time.
    #[error("handshake with {peer} timed out after {timeout:?}")]
    HandshakeTimedOut { peer: SocketAddr, timeout: Duration },

    /// The peer's handshake was rejected.
    #[cfg(feature = "websocket")]
    #[error("handshake with {peer} failed: {source}")]
    Handshake {
        peer: SocketAddr,
        #[source]
        source: tungstenite::Error,
    },

    /// Writing a frame failed.
    #[cfg(feature = "websocket")]
    #[error("send failed: {0}")]
    Send(#[source] tungstenite::Error),

    /// Reading a frame failed.
    #[cfg(feature = "websocket")]
    #[error("receive failed: {0}")]
    Receive(#[source] tungstenite::Error),

    /// Closing the connection failed.
    #[cfg(feature = "websocket")]
    #[error("close failed: {0}")]
    Close(#[source] tungstenite::Error),
}
