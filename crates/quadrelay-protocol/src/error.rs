//! Error types for the protocol layer.

/// Errors that can occur in the protocol layer.
///
/// Decoding errors are expected in normal operation: clients may send
/// anything, and the session layer drops whatever fails to decode.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, a missing or non-string `type`
    /// field, or a payload that is not an object at all.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}
