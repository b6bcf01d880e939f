//! Session lifecycle for Quadrelay.
//!
//! A session is one connection's life in the broker:
//!
//! ```text
//!   Joining ──(seated, notified)──→ Active ──(disconnect | CloseRoom)──→ Closed
//! ```
//!
//! [`SessionHub`] owns the shared [`RoomRegistry`](quadrelay_room::RoomRegistry)
//! behind a single lock and performs every membership change together
//! with the notifications it causes. Connection tasks hold a [`Session`]
//! and call into the hub for each event.
//!
//! # How it fits in the stack
//!
//! ```text
//! Server (above)  ← one task per connection, drives a Session
//!     ↕
//! Session Layer (this crate)  ← join / relay / close orchestration
//!     ↕
//! Room Layer (below)  ← registry, seats, fan-out
//! ```

mod error;
mod hub;
mod session;

pub use error::SessionError;
pub use hub::{Dispatch, SessionHub};
pub use session::{Session, SessionState};
