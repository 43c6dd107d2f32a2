//! Identity and control types.
//!
//! Everything here is serializable: these are the shapes clients send to
//! drive a room and the keys every layer uses to talk about seats and rooms.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Action;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// One of the two fixed seats in a room.
///
/// Serializes as `"personal"` / `"ai"`. `Personal` always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorId {
    Personal,
    Ai,
}

impl ActorId {
    /// Both seats, in turn order.
    pub const ALL: [ActorId; 2] = [ActorId::Personal, ActorId::Ai];

    /// The seat that opens every round.
    pub const FIRST: ActorId = ActorId::Personal;

    /// The other seat.
    pub fn opponent(self) -> Self {
        match self {
            Self::Personal => Self::Ai,
            Self::Ai => Self::Personal,
        }
    }

    /// Position in [`ActorId::ALL`], handy for per-seat arrays.
    pub fn index(self) -> usize {
        match self {
            Self::Personal => 0,
            Self::Ai => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Ai => "ai",
        }
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The key of a room in the registry.
///
/// Room ids are chosen by clients (a lobby name, a user id, ...), so this
/// wraps a `String` rather than a generated number. `#[serde(transparent)]`
/// keeps it a plain JSON string on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Room used when a control message omits `room_id`.
    pub const DEFAULT_NAME: &'static str = "ai-game-1";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RoomId {
    fn default() -> Self {
        Self::new(Self::DEFAULT_NAME)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Start options
// ---------------------------------------------------------------------------

/// How a human-driven seat interacts with the room's timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HumanMode {
    /// The loop idles on a human seat's turn until its action arrives.
    #[default]
    WaitForTurn,
    /// The timer keeps running and auto-plays a human seat. A human action
    /// that arrives while that seat's tick is in flight cancels the
    /// in-flight decision and is applied instead.
    Preempt,
}

/// Which combat tuning a room uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RulesPreset {
    /// Attack gains 0..=10 money; owned gear may be bought again.
    Classic,
    /// Attack gains 2..=12 money; re-buying owned gear is rejected.
    #[default]
    Generous,
}

/// Per-seat options supplied at start.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct SeatOptions {
    /// Display name. Falls back to the seat's default name.
    pub name: Option<String>,
    pub avatar: Option<String>,
    /// Free text describing how this actor should behave. Seeded into the
    /// external agent's session.
    pub persona: Option<String>,
    /// Marks the seat as driven by a human through `act`.
    pub human: bool,
}

/// Options for `start`. Every `None` falls back to the registry defaults.
///
/// Field names are camelCase on the wire (`tickIntervalMs`). The
/// snake_case spellings are accepted too. Unknown fields are an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct StartOptions {
    pub personal: SeatOptions,
    pub ai: SeatOptions,
    #[serde(alias = "use_external_agent")]
    pub use_external_agent: Option<bool>,
    #[serde(alias = "tick_interval_ms")]
    pub tick_interval_ms: Option<u64>,
    #[serde(alias = "external_every_n_turns")]
    pub external_every_n_turns: Option<u32>,
    #[serde(alias = "external_min_interval_ms")]
    pub external_min_interval_ms: Option<u64>,
    #[serde(alias = "external_timeout_ms")]
    pub external_timeout_ms: Option<u64>,
    #[serde(alias = "price_multiplier")]
    pub price_multiplier: Option<f64>,
    #[serde(alias = "human_mode")]
    pub human_mode: Option<HumanMode>,
    pub rules: Option<RulesPreset>,
    /// Seed for the room's random generator. Makes a match reproducible.
    #[serde(alias = "rng_seed")]
    pub rng_seed: Option<u64>,
}

impl StartOptions {
    /// The options of one seat.
    pub fn seat(&self, actor: ActorId) -> &SeatOptions {
        match actor {
            ActorId::Personal => &self.personal,
            ActorId::Ai => &self.ai,
        }
    }
}

// ---------------------------------------------------------------------------
// Control messages
// ---------------------------------------------------------------------------

/// An inbound room operation.
///
/// Internally tagged: `{ "type": "start", "room_id": "lobby", "options": {...} }`.
/// A missing `room_id` targets [`RoomId::DEFAULT_NAME`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    /// Create the room if it does not exist yet. Idempotent.
    Join {
        #[serde(default)]
        room_id: Option<RoomId>,
    },
    /// (Re)start a match in the room.
    Start {
        #[serde(default)]
        room_id: Option<RoomId>,
        #[serde(default)]
        options: StartOptions,
    },
    /// Force the room back to idle.
    Stop {
        #[serde(default)]
        room_id: Option<RoomId>,
    },
    /// A human-originated action for a human seat.
    Act {
        #[serde(default)]
        room_id: Option<RoomId>,
        actor: ActorId,
        action: Action,
    },
}

impl ControlMessage {
    /// The targeted room, defaulting when the message omits it.
    pub fn room_id(&self) -> RoomId {
        let id = match self {
            Self::Join { room_id }
            | Self::Start { room_id, .. }
            | Self::Stop { room_id }
            | Self::Act { room_id, .. } => room_id,
        };
        id.clone().unwrap_or_default()
    }
}

/// Reply to a [`ControlMessage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlAck {
    pub ok: bool,
    pub room_id: RoomId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ControlAck {
    pub fn ok(room_id: RoomId) -> Self {
        Self {
            ok: true,
            room_id,
            error: None,
        }
    }

    pub fn error(room_id: RoomId, error: impl Into<String>) -> Self {
        Self {
            ok: false,
            room_id,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_id_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ActorId::Personal).unwrap(), "\"personal\"");
        assert_eq!(serde_json::to_string(&ActorId::Ai).unwrap(), "\"ai\"");
    }

    #[test]
    fn test_actor_id_opponent_is_involution() {
        for actor in ActorId::ALL {
            assert_ne!(actor.opponent(), actor);
            assert_eq!(actor.opponent().opponent(), actor);
        }
    }

    #[test]
    fn test_actor_index_matches_all_order() {
        for (i, actor) in ActorId::ALL.iter().enumerate() {
            assert_eq!(actor.index(), i);
        }
        assert_eq!(ActorId::FIRST, ActorId::ALL[0]);
    }

    #[test]
    fn test_room_id_is_plain_string() {
        let json = serde_json::to_string(&RoomId::new("lobby")).unwrap();
        assert_eq!(json, "\"lobby\"");
        assert_eq!(RoomId::default().as_str(), "ai-game-1");
    }

    #[test]
    fn test_control_message_defaults_room_id() {
        let msg: ControlMessage = serde_json::from_str(r#"{"type":"join"}"#).unwrap();
        assert_eq!(msg.room_id(), RoomId::default());

        let msg: ControlMessage =
            serde_json::from_str(r#"{"type":"stop","room_id":"r-7"}"#).unwrap();
        assert_eq!(msg.room_id(), RoomId::new("r-7"));
    }

    #[test]
    fn test_start_options_partial_json() {
        let msg: ControlMessage = serde_json::from_str(
            r#"{"type":"start","options":{"tick_interval_ms":100,"personal":{"name":"Ada","human":true}}}"#,
        )
        .unwrap();
        let ControlMessage::Start { options, .. } = msg else {
            panic!("expected start");
        };
        assert_eq!(options.tick_interval_ms, Some(100));
        assert_eq!(options.personal.name.as_deref(), Some("Ada"));
        assert!(options.seat(ActorId::Personal).human);
        assert!(!options.seat(ActorId::Ai).human);
        assert_eq!(options.price_multiplier, None);
    }

    #[test]
    fn test_start_options_camel_case_names() {
        let msg: ControlMessage = serde_json::from_str(
            r#"{"type":"start","options":{
                "useExternalAgent":true,
                "tickIntervalMs":100,
                "externalEveryNTurns":1,
                "externalMinIntervalMs":0,
                "externalTimeoutMs":1500,
                "priceMultiplier":0.5,
                "humanMode":"preempt",
                "rngSeed":9
            }}"#,
        )
        .unwrap();
        let ControlMessage::Start { options, .. } = msg else {
            panic!("expected start");
        };
        assert_eq!(options.use_external_agent, Some(true));
        assert_eq!(options.tick_interval_ms, Some(100));
        assert_eq!(options.external_every_n_turns, Some(1));
        assert_eq!(options.external_min_interval_ms, Some(0));
        assert_eq!(options.external_timeout_ms, Some(1500));
        assert_eq!(options.price_multiplier, Some(0.5));
        assert_eq!(options.human_mode, Some(HumanMode::Preempt));
        assert_eq!(options.rng_seed, Some(9));

        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json["tickIntervalMs"], 100);
        assert_eq!(json["priceMultiplier"], 0.5);
    }

    #[test]
    fn test_start_options_reject_unknown_fields() {
        let misspelled: Result<ControlMessage, _> =
            serde_json::from_str(r#"{"type":"start","options":{"tickIntervallMs":100}}"#);
        assert!(misspelled.is_err());

        let seat: Result<ControlMessage, _> =
            serde_json::from_str(r#"{"type":"start","options":{"ai":{"nickname":"x"}}}"#);
        assert!(seat.is_err());
    }

    #[test]
    fn test_act_message_carries_validated_action() {
        let msg: ControlMessage = serde_json::from_str(
            r#"{"type":"act","actor":"personal","action":{"action":"BUY_ITEM","details":{"item_id":"item_001"}}}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ControlMessage::Act {
                room_id: None,
                actor: ActorId::Personal,
                action: Action::BuyItem {
                    item_id: "item_001".into()
                },
            }
        );
    }

    #[test]
    fn test_act_message_rejects_unknown_action() {
        let result: Result<ControlMessage, _> = serde_json::from_str(
            r#"{"type":"act","actor":"ai","action":{"action":"FLY","details":{}}}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_ack_omits_missing_error() {
        let json = serde_json::to_value(ControlAck::ok(RoomId::new("a"))).unwrap();
        assert_eq!(json, serde_json::json!({"ok": true, "room_id": "a"}));

        let ack = ControlAck::error(RoomId::new("a"), "nope");
        assert!(!ack.ok);
        assert_eq!(ack.error.as_deref(), Some("nope"));
    }
}
