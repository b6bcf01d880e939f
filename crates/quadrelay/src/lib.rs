//! # Quadrelay
//!
//! Real-time session broker for small multiplayer web games.
//!
//! Clients connect over WebSocket and are seated in the first room with a
//! free seat (four seats by default). Every message a client sends is
//! relayed verbatim to the other members of its room; the broker itself
//! only interprets `CloseRoom`. Membership changes are announced with
//! `PlayerId`, `AllPlayerIds`, `PlayerJoined`, `Message: GameReady`,
//! `PlayerDisconnected` and `RoomClosed` records.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quadrelay::prelude::*;
//!
//! # async fn start() -> Result<(), QuadrelayError> {
//! let server = QuadrelayServer::builder()
//!     .bind("0.0.0.0:3000")
//!     .build()
//!     .await?;
//! server.run_until(async {
//!     let _ = tokio::signal::ctrl_c().await;
//! })
//! .await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::QuadrelayError;
pub use server::{QuadrelayServer, QuadrelayServerBuilder, ServerConfig};

/// Re-exports for embedding the broker.
pub mod prelude {
    pub use crate::{QuadrelayError, QuadrelayServer, QuadrelayServerBuilder, ServerConfig};
    pub use quadrelay_protocol::{ClientMessage, Notice, PlayerId, RoomId, ServerMessage};
    pub use quadrelay_room::{RoomConfig, RoomInfo};
    pub use quadrelay_session::SessionHub;
}
