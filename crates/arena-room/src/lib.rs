//! Room lifecycle management for Arena.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns one
//! [`RoomState`](arena_combat::RoomState), its tick scheduler and the
//! external agent sessions of its seats. Rooms share nothing but the
//! reasoning service.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: creates, looks up and removes rooms
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`RoomConfig`]: per-match settings (tick interval, throttling, prices)
//! - [`RoomEvent`] / [`Broadcaster`]: what subscribers receive

mod broadcast;
mod config;
mod error;
mod manager;
mod room;

pub use broadcast::{Broadcaster, EventReceiver, EventSender, LOOP_ERROR, RoomEvent};
pub use config::RoomConfig;
pub use error::RoomError;
pub use manager::RoomRegistry;
pub use room::{RoomHandle, RoomInfo};
