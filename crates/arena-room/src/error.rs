//! Error types for the room layer.

use arena_combat::CombatError;
use arena_protocol::{ActorId, RoomId};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The room's phase does not allow this operation, e.g. `start` while
    /// a match is playing or `act` in an idle room.
    #[error("invalid room state: {0}")]
    InvalidState(#[from] CombatError),

    /// A human action arrived for the seat that is not on the move.
    #[error("it is {turn}'s turn, not {actor}'s")]
    NotYourTurn { actor: ActorId, turn: ActorId },

    /// `act` was sent for a seat that is not human-driven.
    #[error("seat {0} is not human-driven")]
    NotHumanSeat(ActorId),

    /// The room's command channel is full.
    #[error("room {0} is busy")]
    Busy(RoomId),

    /// A decision came back for a seat that is not on the move.
    #[error("decision for {found} but it is {expected}'s turn")]
    TurnMismatch { expected: ActorId, found: ActorId },

    /// The room's command channel is closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}
