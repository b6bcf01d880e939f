//! Error types for the session layer.

use quadrelay_protocol::ProtocolError;
use quadrelay_transport::ConnectionId;

/// Errors returned while handling an inbound message.
///
/// Neither is fatal: the connection task logs them and keeps going (or,
/// for `Closed`, stops reading).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The payload couldn't be read as a typed record; it was dropped.
    #[error("dropped malformed message: {0}")]
    Malformed(#[from] ProtocolError),

    /// The session is closed; nothing further is relayed for it.
    #[error("session for {0} is closed")]
    Closed(ConnectionId),
}
