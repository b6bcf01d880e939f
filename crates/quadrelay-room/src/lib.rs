//! Room bookkeeping for Quadrelay.
//!
//! Groups connections into rooms of up to four seats, hands out seat
//! numbers, and fans frames out to a room's members.
//!
//! # Key types
//!
//! - [`ConnectionHandle`]: a cloneable handle to one live connection
//!   that queues frames and carries a closed flag
//! - [`Room`] / [`Participant`]: a room's ordered member list
//! - [`RoomRegistry`]: every open room; first-fit seat assignment and
//!   room-scoped broadcast
//! - [`RoomConfig`]: capacity and notification policy
//!
//! The registry is a plain single-owner structure. Callers that share it
//! between tasks put it behind a lock and do all fan-out while holding
//! that lock, so membership changes and the notifications about them are
//! observed in one order by every member.

mod config;
mod handle;
mod registry;
mod room;

pub use config::RoomConfig;
pub use handle::{ConnectionHandle, Outbound, OutboundReceiver};
pub use registry::{Assignment, Departure, RoomRegistry, Seat};
pub use room::{Participant, Room, RoomInfo};
