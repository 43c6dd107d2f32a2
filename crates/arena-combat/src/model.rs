//! Actors, stats, inventories and log entries.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use arena_protocol::{ActionKind, ActorId, SeatOptions};
use serde::{Deserialize, Serialize};

use crate::shop::{PotionKind, ShopItem, StatBonus};

/// Milliseconds since the Unix epoch. Used for log timestamps.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// A seat's numbers.
///
/// `hp <= max_hp` and `stamina <= max_stamina` hold after every mutation
/// made through the methods below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub hp: u32,
    pub max_hp: u32,
    pub stamina: u32,
    pub max_stamina: u32,
    pub money: u32,
    pub power: u32,
    pub defense: u32,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            hp: 100,
            max_hp: 100,
            stamina: 50,
            max_stamina: 50,
            money: 0,
            power: 15,
            defense: 10,
        }
    }
}

impl Stats {
    /// Adds `amount` hp, capped at `max_hp`. Returns the amount actually gained.
    pub fn restore_hp(&mut self, amount: u32) -> u32 {
        let before = self.hp;
        self.hp = self.hp.saturating_add(amount).min(self.max_hp);
        self.hp - before
    }

    /// Adds `amount` stamina, capped at `max_stamina`. Returns the amount actually gained.
    pub fn restore_stamina(&mut self, amount: u32) -> u32 {
        let before = self.stamina;
        self.stamina = self.stamina.saturating_add(amount).min(self.max_stamina);
        self.stamina - before
    }

    /// Adds a gear bonus. Max values grow first, so hp/stamina bonuses are
    /// clamped against the new ceilings.
    pub fn apply_bonus(&mut self, bonus: &StatBonus) {
        self.max_hp = self.max_hp.saturating_add(bonus.max_hp);
        self.max_stamina = self.max_stamina.saturating_add(bonus.max_stamina);
        self.power = self.power.saturating_add(bonus.power);
        self.defense = self.defense.saturating_add(bonus.defense);
        self.restore_hp(bonus.hp);
        self.restore_stamina(bonus.stamina);
    }

    /// Takes `damage` hp, flooring at zero. Returns `true` when hp hits zero.
    pub fn take_damage(&mut self, damage: u32) -> bool {
        self.hp = self.hp.saturating_sub(damage);
        self.hp == 0
    }

    pub fn vitals(&self) -> Vitals {
        Vitals {
            hp: self.hp,
            stamina: self.stamina,
            money: self.money,
        }
    }
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

/// Owned gear plus the two potion shelves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub items: Vec<ShopItem>,
    pub hp_potions: Vec<ShopItem>,
    pub stamina_potions: Vec<ShopItem>,
}

impl Inventory {
    pub fn owns(&self, item_id: &str) -> bool {
        self.items.iter().any(|i| i.id == item_id)
    }

    pub fn has_potion(&self, potion_id: &str) -> bool {
        self.potions()
            .any(|p| p.id == potion_id)
    }

    /// Removes the first potion with `potion_id`, searching hp potions then
    /// stamina potions. Only one copy is removed even if several share the id.
    pub fn take_potion(&mut self, potion_id: &str) -> Option<ShopItem> {
        for shelf in [&mut self.hp_potions, &mut self.stamina_potions] {
            if let Some(pos) = shelf.iter().position(|p| p.id == potion_id) {
                return Some(shelf.remove(pos));
            }
        }
        None
    }

    /// Appends a bought potion to the shelf matching its effect.
    pub fn add_potion(&mut self, potion: ShopItem) {
        match potion.restore() {
            Some((PotionKind::Stamina, _)) => self.stamina_potions.push(potion),
            _ => self.hp_potions.push(potion),
        }
    }

    /// The owned potion of `kind` with the largest restore amount.
    pub fn best_potion(&self, kind: PotionKind) -> Option<&ShopItem> {
        let shelf = match kind {
            PotionKind::Hp => &self.hp_potions,
            PotionKind::Stamina => &self.stamina_potions,
        };
        shelf
            .iter()
            .max_by_key(|p| p.restore().map(|(_, amount)| amount).unwrap_or_default())
    }

    /// Ids of everything held, gear first.
    pub fn item_ids(&self) -> Vec<&str> {
        self.items
            .iter()
            .chain(self.potions())
            .map(|i| i.id.as_str())
            .collect()
    }

    fn potions(&self) -> impl Iterator<Item = &ShopItem> {
        self.hp_potions.iter().chain(&self.stamina_potions)
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// The character sitting in one seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
    pub human: bool,
    pub stats: Stats,
    pub inventory: Inventory,
}

impl Actor {
    /// A fresh actor with default stats and an empty inventory.
    pub fn new(id: ActorId, seat: &SeatOptions) -> Self {
        let name = seat
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(Self::default_name(id))
            .to_owned();
        Self {
            id,
            name,
            avatar: seat.avatar.clone(),
            persona: seat.persona.clone(),
            human: seat.human,
            stats: Stats::default(),
            inventory: Inventory::default(),
        }
    }

    pub fn default_name(id: ActorId) -> &'static str {
        match id {
            ActorId::Personal => "Personal",
            ActorId::Ai => "Player 456",
        }
    }
}

// ---------------------------------------------------------------------------
// Log
// ---------------------------------------------------------------------------

/// Why an action was refused. Refusals are log entries, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rejection {
    NotEnoughStamina,
    NotEnoughMoney,
    NotFound,
    AlreadyOwn,
}

impl Rejection {
    pub fn code(self) -> &'static str {
        match self {
            Self::NotEnoughStamina => "NOT_ENOUGH_STAMINA",
            Self::NotEnoughMoney => "NOT_ENOUGH_MONEY",
            Self::NotFound => "NOT_FOUND",
            Self::AlreadyOwn => "ALREADY_OWN",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Where the action in a log entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionSource {
    External,
    Heuristic,
    Human,
}

impl fmt::Display for DecisionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::External => "external",
            Self::Heuristic => "heuristic",
            Self::Human => "human",
        })
    }
}

/// The three numbers clients replay from a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vitals {
    pub hp: u32,
    pub stamina: u32,
    pub money: u32,
}

/// Both seats' vitals, taken right after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub personal: Vitals,
    pub ai: Vitals,
}

impl Snapshot {
    pub fn get(&self, actor: ActorId) -> &Vitals {
        match actor {
            ActorId::Personal => &self.personal,
            ActorId::Ai => &self.ai,
        }
    }
}

/// One resolved action. The log is append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Milliseconds since the Unix epoch.
    pub t: u64,
    pub actor: ActorId,
    pub action: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<ActorId>,
    pub info: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection: Option<Rejection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<DecisionSource>,
    pub after: Snapshot,
}
