//! Wire protocol for Arena.
//!
//! This crate defines the vocabulary shared by every other layer:
//!
//! - **Identity** ([`ActorId`], [`RoomId`]): the two fixed seats of a
//!   room and the room key used by the registry.
//! - **Actions** ([`Action`], [`ActionKind`]): the closed set of moves an
//!   actor can make, plus the validator ([`parse_action`],
//!   [`validate_action`]) that turns untrusted JSON into an `Action`.
//! - **Control** ([`ControlMessage`], [`StartOptions`], [`ControlAck`]):
//!   the inbound room operations.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): bytes in, typed values out.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! external agent text ──parse_action──→ Action ──→ combat resolver
//! client bytes ──Codec──→ ControlMessage ──→ room registry
//! ```

mod action;
mod codec;
mod error;
mod types;

pub use action::{Action, ActionKind, parse_action, validate_action};
pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    ActorId, ControlAck, ControlMessage, HumanMode, RoomId, RulesPreset, SeatOptions,
    StartOptions,
};
