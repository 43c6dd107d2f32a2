//! The shop catalog.
//!
//! [`Shop::catalog`] is the fixed price list. Each room keeps its own copy,
//! produced by [`Shop::scale_prices`] at start, so rooms can run with
//! different economies without touching the catalog.

use serde::{Deserialize, Serialize};

/// Permanent stat increases granted by a gear item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatBonus {
    pub max_hp: u32,
    pub max_stamina: u32,
    pub hp: u32,
    pub stamina: u32,
    pub power: u32,
    pub defense: u32,
}

/// What an item does. The three variants are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemEffect {
    /// Gear: owned permanently, bonus applied once on purchase.
    Bonus(StatBonus),
    /// Consumable that restores hp.
    RestoreHp(u32),
    /// Consumable that restores stamina.
    RestoreStamina(u32),
}

/// The two consumable kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PotionKind {
    Hp,
    Stamina,
}

/// One purchasable entry.
///
/// The effect is flattened, so an hp potion serializes as
/// `{ "id": "potion_001", "name": "...", "price": 30, "restore_hp": 20 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopItem {
    pub id: String,
    pub name: String,
    pub price: u32,
    #[serde(flatten)]
    pub effect: ItemEffect,
}

impl ShopItem {
    fn gear(id: &str, name: &str, price: u32, bonus: StatBonus) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            effect: ItemEffect::Bonus(bonus),
        }
    }

    fn potion(id: &str, name: &str, price: u32, kind: PotionKind, amount: u32) -> Self {
        let effect = match kind {
            PotionKind::Hp => ItemEffect::RestoreHp(amount),
            PotionKind::Stamina => ItemEffect::RestoreStamina(amount),
        };
        Self {
            id: id.into(),
            name: name.into(),
            price,
            effect,
        }
    }

    /// `Some((kind, amount))` for consumables.
    pub fn restore(&self) -> Option<(PotionKind, u32)> {
        match self.effect {
            ItemEffect::RestoreHp(n) => Some((PotionKind::Hp, n)),
            ItemEffect::RestoreStamina(n) => Some((PotionKind::Stamina, n)),
            ItemEffect::Bonus(_) => None,
        }
    }

    /// `Some(bonus)` for gear.
    pub fn bonus(&self) -> Option<&StatBonus> {
        match &self.effect {
            ItemEffect::Bonus(b) => Some(b),
            _ => None,
        }
    }
}

/// A room's price list: gear plus both potion shelves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shop {
    pub items: Vec<ShopItem>,
    pub hp_potions: Vec<ShopItem>,
    pub stamina_potions: Vec<ShopItem>,
}

impl Default for Shop {
    fn default() -> Self {
        Self::catalog()
    }
}

impl Shop {
    /// The fixed catalog at base prices.
    pub fn catalog() -> Self {
        use PotionKind::{Hp, Stamina};

        Self {
            items: vec![
                ShopItem::gear("item_001", "Iron Sword", 120, StatBonus {
                    power: 5,
                    ..StatBonus::default()
                }),
                ShopItem::gear("item_002", "Steel Shield", 150, StatBonus {
                    defense: 7,
                    ..StatBonus::default()
                }),
                ShopItem::gear("item_003", "Leather Armor", 100, StatBonus {
                    defense: 4,
                    stamina: 2,
                    ..StatBonus::default()
                }),
                ShopItem::gear("item_004", "Ring of Vitality", 200, StatBonus {
                    max_hp: 10,
                    ..StatBonus::default()
                }),
                ShopItem::gear("item_005", "Boots of Swiftness", 90, StatBonus {
                    max_stamina: 5,
                    ..StatBonus::default()
                }),
            ],
            hp_potions: vec![
                ShopItem::potion("potion_001", "Small Healing Potion", 30, Hp, 20),
                ShopItem::potion("potion_002", "Medium Healing Potion", 70, Hp, 50),
                ShopItem::potion("potion_003", "Large Healing Potion", 150, Hp, 100),
                ShopItem::potion("potion_004", "Elixir of Life", 300, Hp, 200),
            ],
            stamina_potions: vec![
                ShopItem::potion("spotion_001", "Minor Stamina Potion", 20, Stamina, 10),
                ShopItem::potion("spotion_002", "Lesser Stamina Potion", 50, Stamina, 25),
                ShopItem::potion("spotion_003", "Greater Stamina Potion", 100, Stamina, 50),
                ShopItem::potion("spotion_004", "Elixir of Endurance", 200, Stamina, 100),
            ],
        }
    }

    /// A deep copy with every price replaced by `max(1, round(price * multiplier))`.
    pub fn scale_prices(&self, multiplier: f64) -> Self {
        let scale = |item: &ShopItem| ShopItem {
            price: ((item.price as f64 * multiplier).round() as u32).max(1),
            ..item.clone()
        };
        Self {
            items: self.items.iter().map(scale).collect(),
            hp_potions: self.hp_potions.iter().map(scale).collect(),
            stamina_potions: self.stamina_potions.iter().map(scale).collect(),
        }
    }

    /// Looks an id up in gear, then hp potions, then stamina potions.
    pub fn find(&self, id: &str) -> Option<&ShopItem> {
        self.iter().find(|item| item.id == id)
    }

    /// Every entry, in lookup order.
    pub fn iter(&self) -> impl Iterator<Item = &ShopItem> {
        self.items
            .iter()
            .chain(&self.hp_potions)
            .chain(&self.stamina_potions)
    }

    pub fn potions(&self, kind: PotionKind) -> &[ShopItem] {
        match kind {
            PotionKind::Hp => &self.hp_potions,
            PotionKind::Stamina => &self.stamina_potions,
        }
    }

    /// The cheapest potion of `kind` costing at most `money`.
    pub fn cheapest_affordable(&self, kind: PotionKind, money: u32) -> Option<&ShopItem> {
        self.potions(kind)
            .iter()
            .filter(|p| p.price <= money)
            .min_by_key(|p| p.price)
    }
}
