//! Control messages end to end: bytes in, acks and room events out.

use std::time::Duration;

use arena::prelude::*;

fn quick() -> RoomConfig {
    RoomConfig {
        tick_interval: Duration::from_millis(100),
        rng_seed: Some(11),
        ..RoomConfig::default()
    }
}

async fn ack(arena: &Arena, json: &str) -> serde_json::Value {
    let bytes = arena.handle_bytes(json.as_bytes()).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_join_defaults_room_id() {
    let arena = Arena::offline(quick());
    let reply = ack(&arena, r#"{"type":"join"}"#).await;
    assert_eq!(reply, serde_json::json!({"ok": true, "room_id": "ai-game-1"}));
    assert_eq!(arena.registry().room_ids().await, vec![RoomId::default()]);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_bytes_get_error_ack() {
    let arena = Arena::offline(quick());
    let reply = ack(&arena, "{not json").await;
    assert_eq!(reply["ok"], false);
    assert_eq!(reply["room_id"], "ai-game-1");
    assert!(reply["error"].as_str().unwrap().starts_with("decode failed"));
}

#[tokio::test(start_paused = true)]
async fn test_invalid_action_in_act_is_rejected_at_decode() {
    let arena = Arena::offline(quick());
    let reply = ack(
        &arena,
        r#"{"type":"act","actor":"personal","action":{"action":"FLY","details":{}}}"#,
    )
    .await;
    assert_eq!(reply["ok"], false);
}

#[tokio::test(start_paused = true)]
async fn test_stop_unknown_room_is_error_ack() {
    let arena = Arena::offline(quick());
    let reply = ack(&arena, r#"{"type":"stop","room_id":"nowhere"}"#).await;
    assert_eq!(reply["ok"], false);
    assert_eq!(reply["room_id"], "nowhere");
    assert_eq!(reply["error"], "room nowhere not found");
}

#[tokio::test(start_paused = true)]
async fn test_start_then_events_are_encoded_as_tagged_json() {
    let arena = Arena::offline(quick());
    let room = RoomId::new("lobby");
    let mut events = arena.subscribe(&room).await.unwrap();

    let reply = ack(
        &arena,
        r#"{"type":"start","room_id":"lobby","options":{"personal":{"name":"Ada"}}}"#,
    )
    .await;
    assert_eq!(reply["ok"], true);

    let mut kinds = Vec::new();
    while kinds.len() < 4 {
        let event = tokio::time::timeout(Duration::from_secs(60), events.recv())
            .await
            .unwrap()
            .unwrap();
        let json: serde_json::Value =
            serde_json::from_slice(&arena.encode_event(&event).unwrap()).unwrap();
        kinds.push(json["type"].as_str().unwrap().to_owned());
        if json["type"] == "log" {
            assert_eq!(json["actor"], "personal");
            assert_eq!(json["source"], "heuristic");
            assert!(json["after"]["ai"]["hp"].is_u64());
        }
    }
    assert_eq!(kinds, ["state", "state", "log", "state"]);

    let state = arena.registry().snapshot(&room).await.unwrap();
    assert_eq!(state.players.personal.name, "Ada");
    assert_eq!(state.turn, ActorId::Ai);
}

#[tokio::test(start_paused = true)]
async fn test_human_act_through_control_message() {
    let arena = Arena::offline(quick());
    let start = ControlMessage::Start {
        room_id: None,
        options: StartOptions {
            personal: SeatOptions {
                human: true,
                ..SeatOptions::default()
            },
            ..StartOptions::default()
        },
    };
    assert!(arena.handle(start).await.ok);

    let act = ControlMessage::Act {
        room_id: None,
        actor: ActorId::Personal,
        action: Action::BuyItem {
            item_id: "item_005".into(),
        },
    };
    assert!(arena.handle(act.clone()).await.ok);

    let state = arena.registry().snapshot(&RoomId::default()).await.unwrap();
    let entry = state.log.last().unwrap();
    assert_eq!(entry.source, Some(DecisionSource::Human));
    assert_eq!(entry.rejection, Some(Rejection::NotEnoughMoney));

    let again = arena.handle(act).await;
    assert!(!again.ok);
    assert_eq!(again.error.as_deref(), Some("it is ai's turn, not personal's"));
}

#[tokio::test(start_paused = true)]
async fn test_start_options_use_camel_case_wire_names() {
    let arena = Arena::offline(quick());
    let reply = ack(
        &arena,
        r#"{"type":"start","room_id":"priced","options":{"priceMultiplier":0.5,"tickIntervalMs":100,"rngSeed":3}}"#,
    )
    .await;
    assert_eq!(reply["ok"], true);

    let state = arena.registry().snapshot(&RoomId::new("priced")).await.unwrap();
    assert_eq!(state.phase, Phase::Playing);
    assert_eq!(state.shop.find("item_001").unwrap().price, 60);
}

#[tokio::test(start_paused = true)]
async fn test_misspelled_start_option_is_error_ack() {
    let arena = Arena::offline(quick());
    let reply = ack(
        &arena,
        r#"{"type":"start","room_id":"typo","options":{"priceMultiplyer":0.5}}"#,
    )
    .await;
    assert_eq!(reply["ok"], false);
    assert!(reply["error"].as_str().unwrap().starts_with("decode failed"));
    assert!(arena.registry().room_ids().await.is_empty());
}
