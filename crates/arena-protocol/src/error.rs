//! Error types for the protocol layer.
//!
//! Each crate in Arena defines its own error enum. A `ProtocolError` always
//! means "these bytes or this JSON did not have the shape we expected",
//! never a game-rule problem.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, missing required fields,
    /// wrong data types, or truncated messages.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message decoded but violates a protocol rule.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// An action payload failed validation: unknown action kind, extra
    /// fields, or a missing `item_id` / `potion_id`.
    ///
    /// This is the "no decision" signal of the external agent path and is
    /// always recoverable.
    #[error("invalid action: {0}")]
    InvalidAction(String),
}
