//! The reasoning service seam.

use std::future::Future;

use crate::{AgentError, Turn};

/// Something that continues a conversation with one reply.
///
/// Implementations do not enforce a deadline: [`ExternalAgent`](crate::ExternalAgent)
/// races every call against its own timer and drops the future on timeout.
pub trait ReasoningService: Send + Sync + 'static {
    /// Sends `prompt` after `history` and returns the raw reply text.
    fn complete(
        &self,
        history: &[Turn],
        prompt: &Turn,
    ) -> impl Future<Output = Result<String, AgentError>> + Send;

    /// `false` when calls can never succeed (no key, no endpoint).
    fn is_available(&self) -> bool {
        true
    }
}

/// The service used when none is configured. Every call fails with
/// [`AgentError::Unavailable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Offline;

impl ReasoningService for Offline {
    async fn complete(&self, _history: &[Turn], _prompt: &Turn) -> Result<String, AgentError> {
        Err(AgentError::Unavailable)
    }

    fn is_available(&self) -> bool {
        false
    }
}
