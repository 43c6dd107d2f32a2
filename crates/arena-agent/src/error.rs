//! Error types for the agent layer.

use std::time::Duration;

use arena_protocol::ProtocolError;

/// Why an external consultation produced no decision.
///
/// Every variant is recoverable: the caller falls back to the heuristic.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The service did not answer before the deadline.
    #[error("reasoning service timed out after {0:?}")]
    Timeout(Duration),

    /// The request never got a response (DNS, TLS, connection reset, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success HTTP status.
    #[error("reasoning service returned status {0}")]
    Status(u16),

    /// The service answered, but not with text we can read.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The reply did not validate as an action.
    #[error("invalid action: {0}")]
    Invalid(#[from] ProtocolError),

    /// The action names an item or potion that does not exist for this actor.
    #[error("action references unknown id {0}")]
    Unresolved(String),

    /// No service is configured.
    #[error("no reasoning service configured")]
    Unavailable,

    /// A prompt could not be serialized.
    #[error("failed to encode prompt: {0}")]
    Encode(#[from] serde_json::Error),
}
