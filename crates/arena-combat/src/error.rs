//! Error types for the combat layer.

use crate::Phase;

/// Errors raised by the room phase machine.
///
/// Game-rule failures (no stamina, no money, ...) are not errors: they are
/// [`Rejection`](crate::Rejection)s recorded in the log.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CombatError {
    /// The requested phase change is not allowed from the current phase.
    #[error("cannot move from {from} to {to}")]
    InvalidTransition { from: Phase, to: Phase },

    /// A turn operation was attempted outside of `playing`.
    #[error("room is {0}, not playing")]
    NotPlaying(Phase),
}
