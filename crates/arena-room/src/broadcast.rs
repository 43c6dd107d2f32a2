//! Outbound room events and the per-room subscriber list.

use arena_combat::{LogEntry, RoomState};
use arena_protocol::ActorId;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Code carried by the `error` event when a tick fails unexpectedly.
pub const LOOP_ERROR: &str = "LOOP_ERROR";

/// An event a room emits to its subscribers.
///
/// Internally tagged: `{"type":"log","t":...,"actor":"ai",...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomEvent {
    /// Full room snapshot. Sent after every turn, on start and stop, and
    /// to each new subscriber.
    State(RoomState),
    /// One resolved action, sent right after it was applied.
    Log(LogEntry),
    /// The match ended. Sent once.
    Over { winner: ActorId, state: RoomState },
    /// The loop hit an unrecoverable fault and the room was force-stopped.
    Error { code: String, message: String },
}

/// Sending half handed to the room for one subscriber.
pub type EventSender = mpsc::UnboundedSender<RoomEvent>;

/// Receiving half returned by `subscribe`.
pub type EventReceiver = mpsc::UnboundedReceiver<RoomEvent>;

/// Fans events out to every live subscriber of a room.
///
/// Subscribers whose receiver was dropped are pruned on the next send.
#[derive(Debug, Default)]
pub struct Broadcaster {
    subscribers: Vec<EventSender>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber and returns its receiver.
    ///
    /// `greeting` is delivered to the new subscriber only.
    pub fn subscribe(&mut self, greeting: RoomEvent) -> EventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        if tx.send(greeting).is_ok() {
            self.subscribers.push(tx);
        }
        rx
    }

    pub fn send(&mut self, event: RoomEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Live subscribers as of the last send.
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriber_gets_greeting_then_broadcasts() {
        let mut hub = Broadcaster::new();
        let mut rx = hub.subscribe(RoomEvent::State(RoomState::new()));
        hub.send(RoomEvent::Error {
            code: LOOP_ERROR.into(),
            message: "boom".into(),
        });

        assert!(matches!(rx.try_recv(), Ok(RoomEvent::State(_))));
        assert!(matches!(rx.try_recv(), Ok(RoomEvent::Error { .. })));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let mut hub = Broadcaster::new();
        let keep = hub.subscribe(RoomEvent::State(RoomState::new()));
        drop(hub.subscribe(RoomEvent::State(RoomState::new())));
        assert_eq!(hub.len(), 2);

        hub.send(RoomEvent::State(RoomState::new()));
        assert_eq!(hub.len(), 1);
        drop(keep);
        hub.send(RoomEvent::State(RoomState::new()));
        assert!(hub.is_empty());
    }

    #[test]
    fn test_event_json_is_internally_tagged() {
        let json = serde_json::to_value(RoomEvent::State(RoomState::new())).unwrap();
        assert_eq!(json["type"], "state");
        assert_eq!(json["phase"], "idle");

        let json = serde_json::to_value(RoomEvent::Over {
            winner: ActorId::Ai,
            state: RoomState::new(),
        })
        .unwrap();
        assert_eq!(json["type"], "over");
        assert_eq!(json["winner"], "ai");
        assert_eq!(json["state"]["round"], 1);

        let json = serde_json::to_value(RoomEvent::Error {
            code: LOOP_ERROR.into(),
            message: "x".into(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"type":"error","code":"LOOP_ERROR","message":"x"}));
    }
}
