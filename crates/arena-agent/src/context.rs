//! The per-turn snapshot handed to decision providers.

use arena_combat::{Actor, LogEntry, Phase, RoomState, Shop};
use arena_protocol::ActorId;

/// An owned view of the room from one actor's seat.
///
/// Captured before a decision is requested so the provider can run on
/// another task without borrowing the room.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnContext {
    pub phase: Phase,
    pub round: u32,
    pub actor: ActorId,
    pub me: Actor,
    pub enemy: Actor,
    pub shop: Shop,
    pub last: Option<LogEntry>,
}

impl TurnContext {
    pub fn capture(state: &RoomState, actor: ActorId) -> Self {
        Self {
            phase: state.phase,
            round: state.round,
            actor,
            me: state.players.get(actor).clone(),
            enemy: state.players.get(actor.opponent()).clone(),
            shop: state.shop.clone(),
            last: state.last_entry().cloned(),
        }
    }
}
