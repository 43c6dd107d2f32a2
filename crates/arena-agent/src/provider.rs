//! The provider trait and the fallback chain.

use std::future::Future;

use arena_combat::DecisionSource;
use arena_protocol::Action;
use tracing::{debug, warn};

use crate::{Consultation, ExternalAgent, Heuristic, ReasoningService, TurnContext};

/// A chosen action and who chose it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub action: Action,
    pub source: DecisionSource,
}

impl Decision {
    pub fn new(action: Action, source: DecisionSource) -> Self {
        Self { action, source }
    }
}

/// Produces the next action for the seat in `ctx`, or nothing.
pub trait DecisionProvider: Send {
    fn source(&self) -> DecisionSource;

    fn propose(&mut self, ctx: &TurnContext) -> impl Future<Output = Option<Action>> + Send;
}

impl DecisionProvider for Heuristic {
    fn source(&self) -> DecisionSource {
        DecisionSource::Heuristic
    }

    async fn propose(&mut self, ctx: &TurnContext) -> Option<Action> {
        Some(Heuristic::choose(ctx))
    }
}

impl<S: ReasoningService> DecisionProvider for ExternalAgent<S> {
    fn source(&self) -> DecisionSource {
        DecisionSource::External
    }

    async fn propose(&mut self, ctx: &TurnContext) -> Option<Action> {
        let outcome = self.consult(ctx).await;
        match &outcome {
            Consultation::Failed(err) => {
                warn!(actor = %ctx.actor, round = ctx.round, error = %err, "external agent failed");
            }
            other => {
                debug!(actor = %ctx.actor, round = ctx.round, outcome = %other, "external agent");
            }
        }
        outcome.into_action()
    }
}

/// Tries `external` first, then always falls back to the heuristic.
///
/// A failed external attempt leaves no trace beyond its log line.
pub async fn decide<P: DecisionProvider>(external: Option<&mut P>, ctx: &TurnContext) -> Decision {
    if let Some(provider) = external {
        if let Some(action) = provider.propose(ctx).await {
            return Decision::new(action, provider.source());
        }
    }
    Decision::new(Heuristic::choose(ctx), DecisionSource::Heuristic)
}
