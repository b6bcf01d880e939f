//! Unified error type for the Quadrelay server.

use quadrelay_protocol::ProtocolError;
use quadrelay_session::SessionError;
use quadrelay_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impls, so
/// `?` converts layer errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum QuadrelayError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (malformed message, closed session).
    #[error(transparent)]
    Session(#[from] SessionError),
}
