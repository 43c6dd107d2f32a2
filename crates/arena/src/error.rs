//! Unified error type for Arena.

use arena_protocol::ProtocolError;
use arena_room::RoomError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impls,
/// so `?` converts sub-crate errors automatically. Reasoning-service
/// failures never reach this type: rooms fall back to the heuristic.
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    /// Bytes or JSON did not have the expected shape.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room refused or could not run an operation.
    #[error(transparent)]
    Room(#[from] RoomError),
}
