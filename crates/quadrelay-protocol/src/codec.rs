//! Codec trait and implementations for serializing/deserializing messages.
//!
//! The session layer is generic over [`Codec`], so the wire format can be
//! swapped without touching room or lifecycle code. [`JsonCodec`] matches
//! what browser game clients speak today.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because a single codec instance is shared by
/// every connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ## Example
///
/// ```rust
/// use quadrelay_protocol::{ClientMessage, Codec, JsonCodec, PlayerId, ServerMessage};
///
/// let codec = JsonCodec;
///
/// let bytes = codec.encode(&ServerMessage::PlayerId(PlayerId(2))).unwrap();
/// assert_eq!(bytes, br#"{"type":"PlayerId","data":2}"#);
///
/// let inbound: ClientMessage = codec.decode(br#"{"type":"CloseRoom"}"#).unwrap();
/// assert_eq!(inbound, ClientMessage::CloseRoom);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
