//! The external agent: throttle, deadline, validation, sanitization.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use arena_protocol::{Action, ActorId, parse_action};
use tokio::time::Instant;

use crate::{AgentError, AgentSession, ReasoningService, SkipReason, Throttle, TurnContext};

/// The outcome of one consultation.
#[derive(Debug)]
pub enum Consultation {
    /// The service returned a valid, resolvable action.
    Decided(Action),
    /// The throttle kept this turn local.
    Skipped(SkipReason),
    /// The call was made and produced nothing usable.
    Failed(AgentError),
}

impl Consultation {
    pub fn into_action(self) -> Option<Action> {
        match self {
            Self::Decided(action) => Some(action),
            Self::Skipped(_) | Self::Failed(_) => None,
        }
    }
}

impl fmt::Display for Consultation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decided(action) => write!(f, "decided {}", action.kind()),
            Self::Skipped(reason) => write!(f, "skipped: {reason}"),
            Self::Failed(err) => write!(f, "failed: {err}"),
        }
    }
}

/// One seat's link to a [`ReasoningService`].
pub struct ExternalAgent<S> {
    session: AgentSession,
    throttle: Throttle,
    service: Arc<S>,
    timeout: Duration,
}

impl<S> fmt::Debug for ExternalAgent<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalAgent")
            .field("actor", &self.session.actor())
            .field("transcript_len", &self.session.transcript().len())
            .field("throttle", &self.throttle)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl<S: ReasoningService> ExternalAgent<S> {
    pub fn new(service: Arc<S>, session: AgentSession, throttle: Throttle, timeout: Duration) -> Self {
        Self {
            session,
            throttle,
            service,
            timeout,
        }
    }

    pub fn actor(&self) -> ActorId {
        self.session.actor()
    }

    pub fn session(&self) -> &AgentSession {
        &self.session
    }

    /// Asks the service for this turn's action.
    ///
    /// Never returns an error: every failure becomes [`Consultation::Failed`]
    /// and the session is left as it was unless the service replied.
    pub async fn consult(&mut self, ctx: &TurnContext) -> Consultation {
        if let Err(reason) = self.throttle.admit(Instant::now()) {
            return Consultation::Skipped(reason);
        }

        let prompt = match AgentSession::turn_prompt(ctx) {
            Ok(prompt) => prompt,
            Err(e) => return Consultation::Failed(e),
        };

        let call = self.service.complete(self.session.transcript(), &prompt);
        let reply = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => return Consultation::Failed(e),
            Err(_) => return Consultation::Failed(AgentError::Timeout(self.timeout)),
        };
        self.session.commit(prompt, reply.as_str());

        let action = match parse_action(&reply) {
            Ok(action) => action,
            Err(e) => return Consultation::Failed(e.into()),
        };
        self.throttle.record_success(Instant::now());

        match sanitize(ctx, action) {
            Ok(action) => Consultation::Decided(action),
            Err(e) => Consultation::Failed(e),
        }
    }
}

/// Checks that the ids an action names exist for this actor.
///
/// A potion must be in the actor's inventory, an item must be in the room's
/// shop. Affordability is left to the resolver, which logs `NOT_ENOUGH_MONEY`.
pub fn sanitize(ctx: &TurnContext, action: Action) -> Result<Action, AgentError> {
    match &action {
        Action::DrinkPotion { potion_id } if !ctx.me.inventory.has_potion(potion_id) => {
            Err(AgentError::Unresolved(potion_id.clone()))
        }
        Action::BuyItem { item_id } if ctx.shop.find(item_id).is_none() => {
            Err(AgentError::Unresolved(item_id.clone()))
        }
        _ => Ok(action),
    }
}
