//! Wire protocol for Quadrelay.
//!
//! This crate defines what travels between the broker and game clients:
//!
//! - **Types** ([`ServerMessage`], [`ClientMessage`], [`PlayerId`],
//!   [`RoomId`]): the records that appear on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those records are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! Game payloads are never modelled here. The broker only needs to
//! recognise the `type` discriminator of inbound messages; everything else
//! is relayed as the raw bytes the client sent.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientMessage) → Session (room + seat)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{ClientMessage, Notice, PlayerId, RoomId, ServerMessage};
