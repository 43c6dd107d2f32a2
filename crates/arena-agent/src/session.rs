//! The per-seat conversation with an external reasoning service.
//!
//! The session is seeded once at start with the actor's persona, the rules
//! and the room's priced catalog. Afterwards each turn sends only a compact
//! [`TurnDelta`]. The transcript is an explicit append-only list: a turn is
//! committed only once the service has replied, so a timed-out call leaves
//! no trace.

use arena_combat::{Actor, LogEntry, Phase, Shop, ShopItem, Stats};
use arena_protocol::{ActionKind, ActorId};
use serde::{Deserialize, Serialize};

use crate::{AgentError, TurnContext};

/// Persona used when the seat did not supply one.
pub const DEFAULT_PERSONA: &str =
    "bold, decisive and fast; always looks to attack and dominate";

const RULES: &str = "\
Strict rules:
- One action per turn: ATTACK | BUY_ITEM | DRINK_POTION | REST.
- ATTACK: needs stamina >= 3; costs 3-10 stamina; damage 0..power; the enemy blocks 0..defense; you gain some money.
- BUY_ITEM: only if you have enough money; use a shop id.
- DRINK_POTION: only potions in your inventory; give potion_id.
- REST: no attack; stamina recovers 0..10.
Return ONLY JSON:
{ \"action\": \"ATTACK\"|\"BUY_ITEM\"|\"DRINK_POTION\"|\"REST\", \"details\": { \"item_id\"?: \"...\", \"potion_id\"?: \"...\" } }";

const STRATEGY: &str = "\
Strategy: if HP is low, buy or drink an HP potion; if stamina < 3, buy a STAMINA potion when affordable, otherwise REST.
Early priority: Boots (item_005) -> Sword (item_001) -> Shield (item_002). Buy as soon as affordable and not owned.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One message in the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// A seat's conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSession {
    actor: ActorId,
    transcript: Vec<Turn>,
}

impl AgentSession {
    /// Starts a conversation whose first message is the setup prompt.
    pub fn seed(actor: &Actor, shop: &Shop, price_multiplier: f64) -> Result<Self, AgentError> {
        let persona = actor
            .persona
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PERSONA);
        let catalog = serde_json::to_string_pretty(shop)?;

        let setup = format!(
            "You are {name}: {persona}\n{RULES}\n\n\
             # Shop (prices already scaled by {price_multiplier}; remember ids, prices and bonuses):\n\
             {catalog}\n\n{STRATEGY}",
            name = actor.name,
        );

        Ok(Self {
            actor: actor.id,
            transcript: vec![Turn::user(setup)],
        })
    }

    pub fn actor(&self) -> ActorId {
        self.actor
    }

    /// Everything said so far, oldest first.
    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    /// Appends a prompt and the reply it got.
    pub fn commit(&mut self, prompt: Turn, reply: impl Into<String>) {
        self.transcript.push(prompt);
        self.transcript.push(Turn::model(reply));
    }

    /// The message for this turn.
    pub fn turn_prompt(ctx: &TurnContext) -> Result<Turn, AgentError> {
        Ok(Turn::user(serde_json::to_string(&TurnDelta::new(ctx))?))
    }
}

// ---------------------------------------------------------------------------
// Per-turn delta
// ---------------------------------------------------------------------------

/// The compact state sent with every turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnDelta<'a> {
    pub phase: Phase,
    pub round: u32,
    pub turn: ActorId,
    pub you: SelfView<'a>,
    pub enemy: EnemyView<'a>,
    pub last_action: Option<LastAction<'a>>,
    pub expect_json: Expectation,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelfView<'a> {
    pub stats: &'a Stats,
    pub inventory: InventoryIds<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InventoryIds<'a> {
    pub items: Vec<&'a str>,
    pub hp_potions: Vec<&'a str>,
    pub stamina_potions: Vec<&'a str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnemyView<'a> {
    pub stats: &'a Stats,
}

#[derive(Debug, Clone, Serialize)]
pub struct LastAction<'a> {
    pub actor: ActorId,
    pub action: ActionKind,
    pub value: u32,
    pub info: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Expectation {
    pub action: [ActionKind; 4],
}

impl<'a> TurnDelta<'a> {
    pub fn new(ctx: &'a TurnContext) -> Self {
        let inv = &ctx.me.inventory;
        Self {
            phase: ctx.phase,
            round: ctx.round,
            turn: ctx.actor,
            you: SelfView {
                stats: &ctx.me.stats,
                inventory: InventoryIds {
                    items: ids(&inv.items),
                    hp_potions: ids(&inv.hp_potions),
                    stamina_potions: ids(&inv.stamina_potions),
                },
            },
            enemy: EnemyView {
                stats: &ctx.enemy.stats,
            },
            last_action: ctx.last.as_ref().map(LastAction::from),
            expect_json: Expectation {
                action: ActionKind::ALL,
            },
        }
    }
}

fn ids(shelf: &[ShopItem]) -> Vec<&str> {
    shelf.iter().map(|i| i.id.as_str()).collect()
}

impl<'a> From<&'a LogEntry> for LastAction<'a> {
    fn from(entry: &'a LogEntry) -> Self {
        Self {
            actor: entry.actor,
            action: entry.action,
            value: entry.value.unwrap_or_default(),
            info: &entry.info,
        }
    }
}
