//! Combat scenarios driven through the public API.

use arena_combat::resolver::{self, CombatRules};
use arena_combat::{Phase, Rejection, RoomState, Shop};
use arena_protocol::{Action, ActionKind, ActorId, SeatOptions};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn playing() -> RoomState {
    let mut state = RoomState::new();
    state
        .start(&SeatOptions::default(), &SeatOptions::default(), Shop::catalog())
        .unwrap();
    state
}

fn rng() -> StdRng {
    StdRng::seed_from_u64(0xA7E)
}

#[test]
fn test_attack_without_stamina_is_logged_and_changes_nothing() {
    let mut state = playing();
    state.players.personal.stats.stamina = 2;
    let before = state.players.clone();

    let res = resolver::attack(&mut state, ActorId::Personal, &CombatRules::default(), &mut rng());

    assert!(!res.applied);
    assert!(!res.killed);
    assert_eq!(res.entry.rejection, Some(Rejection::NotEnoughStamina));
    assert_eq!(res.entry.info, "NOT_ENOUGH_STAMINA");
    assert_eq!(res.entry.after, state.snapshot());
    assert_eq!(state.players, before);

    // The turn still passes, with both seats unchanged.
    state.log.push(res.entry);
    state.advance_turn().unwrap();
    assert_eq!(state.turn, ActorId::Ai);
    assert_eq!(state.players, before);
}

#[test]
fn test_buy_without_money_is_rejected() {
    let mut state = playing();
    state.players.personal.stats.money = 50;

    let res = resolver::buy_item(
        &mut state,
        ActorId::Personal,
        "item_001",
        &CombatRules::default(),
        &mut rng(),
    );

    assert_eq!(res.entry.rejection, Some(Rejection::NotEnoughMoney));
    assert_eq!(state.players.personal.stats.money, 50);
    assert!(state.players.personal.inventory.items.is_empty());
}

#[test]
fn test_buy_unknown_item_is_not_found() {
    let mut state = playing();
    state.players.ai.stats.money = 1_000;

    let res = resolver::buy_item(&mut state, ActorId::Ai, "item_999", &CombatRules::default(), &mut rng());

    assert_eq!(res.entry.rejection, Some(Rejection::NotFound));
    assert_eq!(state.players.ai.stats.money, 1_000);
}

#[test]
fn test_rebuying_owned_gear_is_rejected_under_generous_rules() {
    let mut state = playing();
    state.players.ai.stats.money = 500;
    let rules = CombatRules::generous();

    assert!(resolver::buy_item(&mut state, ActorId::Ai, "item_002", &rules, &mut rng()).applied);
    let money = state.players.ai.stats.money;

    let res = resolver::buy_item(&mut state, ActorId::Ai, "item_002", &rules, &mut rng());
    assert_eq!(res.entry.rejection, Some(Rejection::AlreadyOwn));
    assert_eq!(state.players.ai.stats.money, money);
    assert_eq!(state.players.ai.inventory.items.len(), 1);
    assert_eq!(state.players.ai.stats.defense, 17);
}

#[test]
fn test_buying_a_potion_fills_the_right_shelf() {
    let mut state = playing();
    state.players.personal.stats.money = 100;

    let res = resolver::buy_item(
        &mut state,
        ActorId::Personal,
        "spotion_002",
        &CombatRules::default(),
        &mut rng(),
    );

    assert!(res.applied);
    assert_eq!(res.entry.value, Some(50));
    let me = &state.players.personal;
    assert_eq!(me.stats.money, 50);
    assert_eq!(me.inventory.stamina_potions.len(), 1);
    assert!(me.inventory.hp_potions.is_empty());
}

#[test]
fn test_drinking_only_potion_clamps_and_empties_shelf() {
    let mut state = playing();
    let small = state.shop.find("potion_001").unwrap().clone();
    let me = &mut state.players.personal;
    me.stats.hp = 80;
    me.inventory.hp_potions.push(small);

    let res = resolver::drink_potion(&mut state, ActorId::Personal, "potion_001", &mut rng());

    assert!(res.applied);
    assert_eq!(state.players.personal.stats.hp, 100);
    assert!(state.players.personal.inventory.hp_potions.is_empty());
    assert!(state.players.personal.stats.stamina <= 50);
}

#[test]
fn test_drinking_duplicate_ids_removes_one() {
    let mut state = playing();
    let small = state.shop.find("spotion_001").unwrap().clone();
    let me = &mut state.players.ai;
    me.stats.stamina = 10;
    me.inventory.stamina_potions = vec![small.clone(), small];

    resolver::drink_potion(&mut state, ActorId::Ai, "spotion_001", &mut rng());

    assert_eq!(state.players.ai.inventory.stamina_potions.len(), 1);
    assert!(state.players.ai.stats.stamina >= 20);
}

#[test]
fn test_drinking_missing_potion_is_not_found() {
    let mut state = playing();
    let before = state.players.clone();

    let res = resolver::drink_potion(&mut state, ActorId::Ai, "potion_004", &mut rng());

    assert_eq!(res.entry.rejection, Some(Rejection::NotFound));
    assert_eq!(res.entry.action, ActionKind::DrinkPotion);
    assert_eq!(state.players, before);
}

#[test]
fn test_lethal_attack_reports_kill() {
    let mut state = playing();
    state.players.ai.stats.hp = 1;
    state.players.ai.stats.defense = 0;
    state.players.personal.stats.power = 1_000;

    // raw is uniform in 0..=1000, so some seed lands a hit quickly.
    let mut rng = rng();
    let res = loop {
        let res = resolver::attack(&mut state, ActorId::Personal, &CombatRules::default(), &mut rng);
        if res.killed {
            break res;
        }
        state.players.personal.stats.stamina = 50;
    };

    assert_eq!(state.players.ai.stats.hp, 0);
    assert_eq!(res.entry.after.ai.hp, 0);

    state.finish(ActorId::Personal).unwrap();
    assert_eq!(state.phase, Phase::Summary);
    assert_eq!(state.winner, Some(ActorId::Personal));
}

#[test]
fn test_vitals_stay_in_bounds_over_a_random_match() {
    let mut state = playing();
    let mut rng = rng();
    let rules = CombatRules::generous();
    let shop = Shop::catalog();
    let ids: Vec<String> = shop.iter().map(|i| i.id.clone()).collect();

    for i in 0..500usize {
        let actor = state.turn;
        let action = match i % 5 {
            0 | 1 => Action::Attack,
            2 => Action::Rest,
            3 => Action::BuyItem {
                item_id: ids[i % ids.len()].clone(),
            },
            _ => Action::DrinkPotion {
                potion_id: ids[(i / 5) % ids.len()].clone(),
            },
        };

        let res = resolver::apply(&mut state, actor, &action, &rules, &mut rng);
        assert_eq!(res.entry.actor, actor);
        if let Some(roll) = res.attack {
            assert!(roll.damage <= roll.raw);
        }
        for id in ActorId::ALL {
            let s = &state.players.get(id).stats;
            assert!(s.hp <= s.max_hp);
            assert!(s.stamina <= s.max_stamina);
        }
        if res.killed {
            break;
        }
        state.advance_turn().unwrap();
    }
}
