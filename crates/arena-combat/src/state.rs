//! Room data and its phase machine.

use std::fmt;

use arena_protocol::{ActorId, SeatOptions};
use serde::{Deserialize, Serialize};

use crate::{Actor, CombatError, LogEntry, Shop, Snapshot};

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// The lifecycle phase of a room.
///
/// ```text
/// Idle → Playing → Summary
///   ↑       │         │
///   └───────┴─────────┘   stop
///           ↑         │
///           └─────────┘   start (rematch)
/// ```
///
/// - **Idle**: no match. Log empty, no winner.
/// - **Playing**: the tick loop is active.
/// - **Summary**: someone was killed. Winner set, loop halted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Playing,
    Summary,
}

impl Phase {
    /// Returns `true` if moving to `target` is allowed.
    ///
    /// `Idle` is reachable from anywhere (that is what `stop` does).
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (_, Self::Idle) | (Self::Idle | Self::Summary, Self::Playing) | (Self::Playing, Self::Summary)
        )
    }

    pub fn is_playing(self) -> bool {
        self == Self::Playing
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Playing => "playing",
            Self::Summary => "summary",
        })
    }
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

/// The two seats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Players {
    pub personal: Actor,
    pub ai: Actor,
}

impl Players {
    pub fn new(personal: &SeatOptions, ai: &SeatOptions) -> Self {
        Self {
            personal: Actor::new(ActorId::Personal, personal),
            ai: Actor::new(ActorId::Ai, ai),
        }
    }

    pub fn get(&self, id: ActorId) -> &Actor {
        match id {
            ActorId::Personal => &self.personal,
            ActorId::Ai => &self.ai,
        }
    }

    pub fn get_mut(&mut self, id: ActorId) -> &mut Actor {
        match id {
            ActorId::Personal => &mut self.personal,
            ActorId::Ai => &mut self.ai,
        }
    }

    /// `(actor, opponent)` borrowed mutably at the same time.
    pub fn pair_mut(&mut self, id: ActorId) -> (&mut Actor, &mut Actor) {
        match id {
            ActorId::Personal => (&mut self.personal, &mut self.ai),
            ActorId::Ai => (&mut self.ai, &mut self.personal),
        }
    }
}

impl Default for Players {
    fn default() -> Self {
        Self::new(&SeatOptions::default(), &SeatOptions::default())
    }
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// Everything a client needs to render a room. Broadcast as the `state` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomState {
    pub phase: Phase,
    /// Whose move it is.
    pub turn: ActorId,
    /// Starts at 1 and grows each time the turn returns to [`ActorId::FIRST`].
    pub round: u32,
    pub players: Players,
    /// This room's price-scaled copy of the catalog.
    pub shop: Shop,
    pub log: Vec<LogEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<ActorId>,
}

impl Default for RoomState {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomState {
    /// An idle room with default actors and the base catalog.
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            turn: ActorId::FIRST,
            round: 1,
            players: Players::default(),
            shop: Shop::catalog(),
            log: Vec::new(),
            winner: None,
        }
    }

    /// Begins a match: fresh actors, round 1, first actor to move, empty log.
    ///
    /// Allowed from `Idle` and from `Summary` (a rematch).
    pub fn start(
        &mut self,
        personal: &SeatOptions,
        ai: &SeatOptions,
        shop: Shop,
    ) -> Result<(), CombatError> {
        self.transition(Phase::Playing)?;
        self.turn = ActorId::FIRST;
        self.round = 1;
        self.players = Players::new(personal, ai);
        self.shop = shop;
        self.log.clear();
        self.winner = None;
        Ok(())
    }

    /// Ends the match with `winner`.
    pub fn finish(&mut self, winner: ActorId) -> Result<(), CombatError> {
        self.transition(Phase::Summary)?;
        self.winner = Some(winner);
        Ok(())
    }

    /// Forces the room back to `Idle` from any phase.
    pub fn stop(&mut self) {
        self.phase = Phase::Idle;
        self.log.clear();
        self.winner = None;
    }

    /// Hands the move to the opponent. Returns the new round number.
    pub fn advance_turn(&mut self) -> Result<u32, CombatError> {
        if !self.phase.is_playing() {
            return Err(CombatError::NotPlaying(self.phase));
        }
        self.turn = self.turn.opponent();
        if self.turn == ActorId::FIRST {
            self.round += 1;
        }
        Ok(self.round)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            personal: self.players.personal.stats.vitals(),
            ai: self.players.ai.stats.vitals(),
        }
    }

    pub fn last_entry(&self) -> Option<&LogEntry> {
        self.log.last()
    }

    fn transition(&mut self, to: Phase) -> Result<(), CombatError> {
        if !self.phase.can_transition_to(to) {
            return Err(CombatError::InvalidTransition {
                from: self.phase,
                to,
            });
        }
        self.phase = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing() -> RoomState {
        let mut state = RoomState::new();
        state
            .start(&SeatOptions::default(), &SeatOptions::default(), Shop::catalog())
            .unwrap();
        state
    }

    #[test]
    fn test_phase_transitions() {
        assert!(Phase::Idle.can_transition_to(Phase::Playing));
        assert!(Phase::Playing.can_transition_to(Phase::Summary));
        assert!(Phase::Summary.can_transition_to(Phase::Playing));
        assert!(Phase::Playing.can_transition_to(Phase::Idle));
        assert!(Phase::Summary.can_transition_to(Phase::Idle));

        assert!(!Phase::Idle.can_transition_to(Phase::Summary));
        assert!(!Phase::Playing.can_transition_to(Phase::Playing));
    }

    #[test]
    fn test_new_room_is_idle() {
        let state = RoomState::new();
        assert_eq!(state.phase, Phase::Idle);
        assert!(state.log.is_empty());
        assert!(state.winner.is_none());
    }

    #[test]
    fn test_start_resets_match() {
        let mut state = playing();
        state.advance_turn().unwrap();
        state.advance_turn().unwrap();
        state.players.ai.stats.money = 99;
        state.finish(ActorId::Ai).unwrap();

        let seat = SeatOptions {
            name: Some("Bob".into()),
            ..SeatOptions::default()
        };
        state.start(&seat, &SeatOptions::default(), Shop::catalog().scale_prices(0.5)).unwrap();

        assert_eq!(state.phase, Phase::Playing);
        assert_eq!(state.round, 1);
        assert_eq!(state.turn, ActorId::Personal);
        assert_eq!(state.players.personal.name, "Bob");
        assert_eq!(state.players.ai.stats.money, 0);
        assert!(state.winner.is_none());
        assert_eq!(state.shop.find("item_001").unwrap().price, 60);
    }

    #[test]
    fn test_start_while_playing_is_rejected() {
        let mut state = playing();
        let err = state
            .start(&SeatOptions::default(), &SeatOptions::default(), Shop::catalog())
            .unwrap_err();
        assert_eq!(
            err,
            CombatError::InvalidTransition {
                from: Phase::Playing,
                to: Phase::Playing
            }
        );
    }

    #[test]
    fn test_round_increments_when_first_actor_regains_turn() {
        let mut state = playing();
        assert_eq!(state.advance_turn().unwrap(), 1);
        assert_eq!(state.turn, ActorId::Ai);
        assert_eq!(state.advance_turn().unwrap(), 2);
        assert_eq!(state.turn, ActorId::Personal);
        assert_eq!(state.advance_turn().unwrap(), 2);
    }

    #[test]
    fn test_advance_turn_outside_playing_fails() {
        let mut state = RoomState::new();
        assert_eq!(
            state.advance_turn(),
            Err(CombatError::NotPlaying(Phase::Idle))
        );
    }

    #[test]
    fn test_finish_sets_winner_and_stop_clears_it() {
        let mut state = playing();
        state.finish(ActorId::Personal).unwrap();
        assert_eq!(state.phase, Phase::Summary);
        assert_eq!(state.winner, Some(ActorId::Personal));
        assert!(state.finish(ActorId::Ai).is_err());

        state.stop();
        assert_eq!(state.phase, Phase::Idle);
        assert!(state.winner.is_none());
        assert!(state.log.is_empty());
    }

    #[test]
    fn test_state_json_shape() {
        let json = serde_json::to_value(playing()).unwrap();
        assert_eq!(json["phase"], "playing");
        assert_eq!(json["turn"], "personal");
        assert_eq!(json["round"], 1);
        assert_eq!(json["players"]["ai"]["name"], "Player 456");
        assert!(json.get("winner").is_none());
    }
}
