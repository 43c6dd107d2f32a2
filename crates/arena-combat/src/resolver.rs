//! The combat resolver.
//!
//! Four total functions, one per action kind. Each mutates the room only on
//! success and always returns a [`LogEntry`] carrying the after-snapshot of
//! both seats. Refusals come back as entries with a [`Rejection`] set and
//! leave every stat untouched.
//!
//! The resolver does not push to the log or change phase. The room loop
//! does both.

use arena_protocol::{Action, ActionKind, ActorId, RulesPreset};
use rand::Rng;

use crate::{LogEntry, PotionKind, Rejection, RoomState, Stats, now_millis};

/// Attacks need at least this much stamina.
pub const ATTACK_MIN_STAMINA: u32 = 3;
/// Upper bound of an attack's stamina cost.
pub const ATTACK_MAX_COST: u32 = 10;
/// Upper bound of a rest's stamina gain.
pub const REST_MAX: u32 = 10;
/// Upper bound of the stamina trickle after drinking or buying.
pub const PASSIVE_MAX: u32 = 10;

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Tunable parts of the combat rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombatRules {
    min_gain: u32,
    max_gain: u32,
    reject_owned_items: bool,
}

impl CombatRules {
    /// Custom rules. The gain bounds are reordered if given backwards.
    pub fn new(min_gain: u32, max_gain: u32, reject_owned_items: bool) -> Self {
        Self {
            min_gain: min_gain.min(max_gain),
            max_gain: min_gain.max(max_gain),
            reject_owned_items,
        }
    }

    /// Attack gains 0..=10 money; owned gear may be bought again.
    pub fn classic() -> Self {
        Self::new(0, 10, false)
    }

    /// Attack gains 2..=12 money; re-buying owned gear is `ALREADY_OWN`.
    pub fn generous() -> Self {
        Self::new(2, 12, true)
    }

    pub fn money_gain(&self) -> (u32, u32) {
        (self.min_gain, self.max_gain)
    }

    pub fn rejects_owned_items(&self) -> bool {
        self.reject_owned_items
    }
}

impl Default for CombatRules {
    fn default() -> Self {
        Self::generous()
    }
}

impl From<RulesPreset> for CombatRules {
    fn from(preset: RulesPreset) -> Self {
        match preset {
            RulesPreset::Classic => Self::classic(),
            RulesPreset::Generous => Self::generous(),
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// The dice of a successful attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackRoll {
    pub cost: u32,
    pub raw: u32,
    pub blocked: u32,
    pub damage: u32,
    pub gain: u32,
}

/// What one action did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub entry: LogEntry,
    /// `false` when the action was refused and nothing changed.
    pub applied: bool,
    /// The opponent's hp reached zero.
    pub killed: bool,
    pub attack: Option<AttackRoll>,
}

impl Resolution {
    fn applied(entry: LogEntry) -> Self {
        Self {
            entry,
            applied: true,
            killed: false,
            attack: None,
        }
    }

    fn rejected(state: &RoomState, actor: ActorId, action: ActionKind, why: Rejection) -> Self {
        let mut entry = entry(state, actor, action, why.code().to_owned());
        entry.rejection = Some(why);
        Self {
            entry,
            applied: false,
            killed: false,
            attack: None,
        }
    }
}

fn entry(state: &RoomState, actor: ActorId, action: ActionKind, info: String) -> LogEntry {
    LogEntry {
        t: now_millis(),
        actor,
        action,
        value: None,
        target: None,
        info,
        rejection: None,
        source: None,
        after: state.snapshot(),
    }
}

// ---------------------------------------------------------------------------
// Resolver functions
// ---------------------------------------------------------------------------

/// Dispatches a validated action to the matching resolver function.
pub fn apply<R: Rng + ?Sized>(
    state: &mut RoomState,
    actor: ActorId,
    action: &Action,
    rules: &CombatRules,
    rng: &mut R,
) -> Resolution {
    match action {
        Action::Attack => attack(state, actor, rules, rng),
        Action::Rest => rest(state, actor, rng),
        Action::DrinkPotion { potion_id } => drink_potion(state, actor, potion_id, rng),
        Action::BuyItem { item_id } => buy_item(state, actor, item_id, rules, rng),
    }
}

/// Strikes the opponent.
///
/// Refused with `NOT_ENOUGH_STAMINA` below [`ATTACK_MIN_STAMINA`]. Otherwise
/// rolls the cost, raw damage, the opponent's block and the money gained.
pub fn attack<R: Rng + ?Sized>(
    state: &mut RoomState,
    actor: ActorId,
    rules: &CombatRules,
    rng: &mut R,
) -> Resolution {
    let target = actor.opponent();
    let (me, enemy) = state.players.pair_mut(actor);

    if me.stats.stamina < ATTACK_MIN_STAMINA {
        return Resolution::rejected(state, actor, ActionKind::Attack, Rejection::NotEnoughStamina);
    }

    let cost = rng.random_range(ATTACK_MIN_STAMINA..=me.stats.stamina.min(ATTACK_MAX_COST));
    let raw = rng.random_range(0..=me.stats.power);
    let blocked = rng.random_range(0..=enemy.stats.defense);
    let damage = raw.saturating_sub(blocked);
    let (lo, hi) = rules.money_gain();
    let gain = rng.random_range(lo..=hi);

    me.stats.stamina -= cost;
    me.stats.money = me.stats.money.saturating_add(gain);
    let killed = enemy.stats.take_damage(damage);

    let info = format!("hit for {damage} (raw {raw}, blocked {blocked}), -{cost} stamina, +{gain} money");
    let mut entry = entry(state, actor, ActionKind::Attack, info);
    entry.value = Some(damage);
    entry.target = Some(target);

    Resolution {
        entry,
        applied: true,
        killed,
        attack: Some(AttackRoll {
            cost,
            raw,
            blocked,
            damage,
            gain,
        }),
    }
}

/// Recovers `0..=REST_MAX` stamina. Never refused.
pub fn rest<R: Rng + ?Sized>(state: &mut RoomState, actor: ActorId, rng: &mut R) -> Resolution {
    let roll = rng.random_range(0..=REST_MAX);
    let gained = state.players.get_mut(actor).stats.restore_stamina(roll);

    let mut entry = entry(state, actor, ActionKind::Rest, format!("+{gained} stamina"));
    entry.value = Some(gained);
    Resolution::applied(entry)
}

/// Drinks one owned potion, then recovers a little stamina.
///
/// Refused with `NOT_FOUND` if the seat holds no potion with that id.
pub fn drink_potion<R: Rng + ?Sized>(
    state: &mut RoomState,
    actor: ActorId,
    potion_id: &str,
    rng: &mut R,
) -> Resolution {
    let me = state.players.get_mut(actor);
    let Some(potion) = me.inventory.take_potion(potion_id) else {
        return Resolution::rejected(state, actor, ActionKind::DrinkPotion, Rejection::NotFound);
    };

    let restored = match potion.restore() {
        Some((PotionKind::Hp, amount)) => me.stats.restore_hp(amount),
        Some((PotionKind::Stamina, amount)) => me.stats.restore_stamina(amount),
        None => 0,
    };
    let passive = passive_restore(&mut me.stats, rng);

    let info = format!("drank {} (+{restored}), +{passive} stamina", potion.name);
    let mut entry = entry(state, actor, ActionKind::DrinkPotion, info);
    entry.value = Some(restored);
    Resolution::applied(entry)
}

/// Buys gear or a potion from the room's shop, then recovers a little stamina.
///
/// Refusals, checked in order: `NOT_FOUND` (not in the shop),
/// `NOT_ENOUGH_MONEY`, and `ALREADY_OWN` for gear when the rules ask for it.
pub fn buy_item<R: Rng + ?Sized>(
    state: &mut RoomState,
    actor: ActorId,
    item_id: &str,
    rules: &CombatRules,
    rng: &mut R,
) -> Resolution {
    let Some(item) = state.shop.find(item_id).cloned() else {
        return Resolution::rejected(state, actor, ActionKind::BuyItem, Rejection::NotFound);
    };

    let me = state.players.get_mut(actor);
    if item.price > me.stats.money {
        return Resolution::rejected(state, actor, ActionKind::BuyItem, Rejection::NotEnoughMoney);
    }
    let bonus = item.bonus().copied();
    if bonus.is_some() && rules.rejects_owned_items() && me.inventory.owns(&item.id) {
        return Resolution::rejected(state, actor, ActionKind::BuyItem, Rejection::AlreadyOwn);
    }

    me.stats.money -= item.price;
    let price = item.price;
    let info_name = item.name.clone();
    match bonus {
        Some(bonus) => {
            me.stats.apply_bonus(&bonus);
            me.inventory.items.push(item);
        }
        None => me.inventory.add_potion(item),
    }
    let passive = passive_restore(&mut me.stats, rng);

    let info = format!("bought {info_name} for {price}, +{passive} stamina");
    let mut entry = entry(state, actor, ActionKind::BuyItem, info);
    entry.value = Some(price);
    Resolution::applied(entry)
}

fn passive_restore<R: Rng + ?Sized>(stats: &mut Stats, rng: &mut R) -> u32 {
    let roll = rng.random_range(0..=PASSIVE_MAX);
    stats.restore_stamina(roll)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Shop;
    use arena_protocol::SeatOptions;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn playing() -> RoomState {
        let mut state = RoomState::new();
        state
            .start(&SeatOptions::default(), &SeatOptions::default(), Shop::catalog())
            .unwrap();
        state
    }

    #[test]
    fn test_rules_presets() {
        assert_eq!(CombatRules::classic().money_gain(), (0, 10));
        assert!(!CombatRules::classic().rejects_owned_items());
        assert_eq!(CombatRules::generous().money_gain(), (2, 12));
        assert!(CombatRules::generous().rejects_owned_items());
        assert_eq!(CombatRules::from(RulesPreset::Classic), CombatRules::classic());
        assert_eq!(CombatRules::new(9, 4, false).money_gain(), (4, 9));
    }

    #[test]
    fn test_attack_rolls_stay_in_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let mut state = playing();
            let res = attack(&mut state, ActorId::Personal, &CombatRules::generous(), &mut rng);
            let roll = res.attack.unwrap();
            assert!((3..=10).contains(&roll.cost));
            assert!(roll.damage <= roll.raw && roll.raw <= 15);
            assert!(roll.blocked <= 10);
            assert!((2..=12).contains(&roll.gain));
            assert_eq!(state.players.ai.stats.hp, 100 - roll.damage);
            assert_eq!(state.players.personal.stats.stamina, 50 - roll.cost);
            assert_eq!(res.entry.target, Some(ActorId::Ai));
            assert_eq!(res.entry.after, state.snapshot());
        }
    }

    #[test]
    fn test_attack_cost_capped_by_stamina() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            let mut state = playing();
            state.players.personal.stats.stamina = 4;
            let roll = attack(&mut state, ActorId::Personal, &CombatRules::classic(), &mut rng)
                .attack
                .unwrap();
            assert!(roll.cost <= 4);
        }
    }

    #[test]
    fn test_rest_clamps_to_max() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut state = playing();
        for _ in 0..20 {
            let res = rest(&mut state, ActorId::Ai, &mut rng);
            assert!(res.applied);
            assert_eq!(state.players.ai.stats.stamina, 50);
        }
    }

    #[test]
    fn test_buy_gear_applies_bonus() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut state = playing();
        state.players.personal.stats.money = 200;

        let res = buy_item(&mut state, ActorId::Personal, "item_004", &CombatRules::classic(), &mut rng);
        assert!(res.applied);
        let me = &state.players.personal;
        assert_eq!(me.stats.money, 0);
        assert_eq!(me.stats.max_hp, 110);
        assert!(me.inventory.owns("item_004"));
    }

    #[test]
    fn test_classic_rules_allow_rebuying_gear() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut state = playing();
        state.players.personal.stats.money = 240;
        let rules = CombatRules::classic();

        assert!(buy_item(&mut state, ActorId::Personal, "item_001", &rules, &mut rng).applied);
        assert!(buy_item(&mut state, ActorId::Personal, "item_001", &rules, &mut rng).applied);
        assert_eq!(state.players.personal.stats.power, 25);
    }

    #[test]
    fn test_apply_dispatches_by_kind() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut state = playing();
        let res = apply(
            &mut state,
            ActorId::Ai,
            &Action::DrinkPotion {
                potion_id: "potion_001".into(),
            },
            &CombatRules::default(),
            &mut rng,
        );
        assert_eq!(res.entry.action, ActionKind::DrinkPotion);
        assert_eq!(res.entry.rejection, Some(Rejection::NotFound));
    }
}
