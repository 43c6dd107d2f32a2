//! Combat rules for Arena.
//!
//! Everything in this crate is synchronous and free of I/O. Randomness is
//! injected through [`rand::Rng`], so a seeded generator replays a match
//! exactly.
//!
//! # Key types
//!
//! - [`RoomState`] / [`Phase`]: one room's data and its phase machine
//! - [`Shop`] / [`ShopItem`]: the catalog and per-room price scaling
//! - [`Actor`], [`Stats`], [`Inventory`]: a seat's character
//! - [`LogEntry`]: the append-only history record
//! - [`resolver`]: attack, rest, drink and buy, plus [`resolver::apply`]

mod error;
mod model;
pub mod resolver;
mod shop;
mod state;

pub use error::CombatError;
pub use model::{
    Actor, DecisionSource, Inventory, LogEntry, Rejection, Snapshot, Stats, Vitals, now_millis,
};
pub use resolver::{AttackRoll, CombatRules, Resolution};
pub use shop::{ItemEffect, PotionKind, Shop, ShopItem, StatBonus};
pub use state::{Phase, Players, RoomState};
