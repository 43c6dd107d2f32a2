//! The local fallback strategy.

use arena_combat::{Actor, PotionKind};
use arena_protocol::Action;

use crate::TurnContext;

/// Gear bought in this order, first affordable unowned piece wins.
const GEAR_PRIORITY: [&str; 5] = ["item_005", "item_001", "item_002", "item_003", "item_004"];

/// Missing this much hp counts as low, whatever the max.
const LOW_HP_MISSING: u32 = 25;
/// Drink a stamina potion at or below this.
const LOW_STAMINA: u32 = 5;
/// Below this an attack would be refused.
const BROKE_STAMINA: u32 = 3;

/// A fixed priority list. Deterministic for a given room state.
///
/// 1. drink the best owned hp potion when hp is low
/// 2. drink the best owned stamina potion when stamina is low
/// 3. buy the cheapest affordable hp potion when hp is low
/// 4. buy the cheapest affordable stamina potion when stamina is below 3
/// 5. buy the first affordable unowned gear from [`GEAR_PRIORITY`]
/// 6. rest when stamina is below 3
/// 7. attack
#[derive(Debug, Clone, Copy, Default)]
pub struct Heuristic;

impl Heuristic {
    pub fn choose(ctx: &TurnContext) -> Action {
        let me = &ctx.me;
        let stats = &me.stats;
        let low_hp = is_low_hp(me);
        let broke = stats.stamina < BROKE_STAMINA;

        if low_hp {
            if let Some(potion) = me.inventory.best_potion(PotionKind::Hp) {
                return drink(&potion.id);
            }
        }
        if stats.stamina <= LOW_STAMINA {
            if let Some(potion) = me.inventory.best_potion(PotionKind::Stamina) {
                return drink(&potion.id);
            }
        }

        if low_hp {
            if let Some(potion) = ctx.shop.cheapest_affordable(PotionKind::Hp, stats.money) {
                return buy(&potion.id);
            }
        }
        if broke {
            if let Some(potion) = ctx.shop.cheapest_affordable(PotionKind::Stamina, stats.money) {
                return buy(&potion.id);
            }
        }

        let gear = GEAR_PRIORITY.iter().find_map(|id| {
            ctx.shop
                .items
                .iter()
                .find(|item| item.id == *id)
                .filter(|item| item.price <= stats.money && !me.inventory.owns(&item.id))
        });
        if let Some(item) = gear {
            return buy(&item.id);
        }

        if broke { Action::Rest } else { Action::Attack }
    }
}

/// `hp <= 60% of max` or missing at least [`LOW_HP_MISSING`].
fn is_low_hp(actor: &Actor) -> bool {
    let s = &actor.stats;
    u64::from(s.hp) * 5 <= u64::from(s.max_hp) * 3 || s.max_hp.saturating_sub(s.hp) >= LOW_HP_MISSING
}

fn drink(id: &str) -> Action {
    Action::DrinkPotion {
        potion_id: id.to_owned(),
    }
}

fn buy(id: &str) -> Action {
    Action::BuyItem {
        item_id: id.to_owned(),
    }
}
