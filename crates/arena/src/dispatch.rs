//! Control-message dispatch.
//!
//! Whatever sits in front of Arena (a socket gateway, a CLI, a test)
//! hands [`ControlMessage`]s, typed or as bytes, to an [`Arena`] and gets
//! a [`ControlAck`] back. Room events go the other way through
//! [`Arena::subscribe`] and [`Arena::encode_event`].

use std::sync::Arc;

use arena_agent::{Offline, ReasoningService};
use arena_protocol::{Codec, ControlAck, ControlMessage, JsonCodec, RoomId};
use arena_room::{EventReceiver, RoomConfig, RoomEvent, RoomRegistry};
use tracing::debug;

use crate::ArenaError;

/// A room registry plus the codec its clients speak.
pub struct Arena<S: ReasoningService = Offline, C: Codec = JsonCodec> {
    registry: Arc<RoomRegistry<S>>,
    codec: C,
}

impl Arena {
    /// Heuristic-only rooms speaking JSON.
    pub fn offline(defaults: RoomConfig) -> Self {
        Self::new(Arc::new(RoomRegistry::offline(defaults)), JsonCodec)
    }
}

impl<S: ReasoningService, C: Codec> Arena<S, C> {
    pub fn new(registry: Arc<RoomRegistry<S>>, codec: C) -> Self {
        Self { registry, codec }
    }

    pub fn registry(&self) -> &Arc<RoomRegistry<S>> {
        &self.registry
    }

    /// Runs one control message against the registry.
    pub async fn execute(&self, msg: ControlMessage) -> Result<RoomId, ArenaError> {
        let room_id = msg.room_id();
        match msg {
            ControlMessage::Join { .. } => {
                self.registry.join(&room_id).await;
            }
            ControlMessage::Start { options, .. } => {
                self.registry.start(&room_id, options).await?;
            }
            ControlMessage::Stop { .. } => {
                self.registry.stop(&room_id).await?;
            }
            ControlMessage::Act { actor, action, .. } => {
                self.registry.act(&room_id, actor, action).await?;
            }
        }
        Ok(room_id)
    }

    /// Like [`execute`](Self::execute), with the outcome folded into an ack.
    pub async fn handle(&self, msg: ControlMessage) -> ControlAck {
        let room_id = msg.room_id();
        match self.execute(msg).await {
            Ok(room_id) => ControlAck::ok(room_id),
            Err(e) => {
                debug!(%room_id, error = %e, "control message rejected");
                ControlAck::error(room_id, e.to_string())
            }
        }
    }

    /// Decodes a control message, runs it and encodes the ack.
    ///
    /// Undecodable input is answered with an error ack for the default
    /// room. Only a failure to encode the ack itself is returned as `Err`.
    pub async fn handle_bytes(&self, data: &[u8]) -> Result<Vec<u8>, ArenaError> {
        let ack = match self.codec.decode::<ControlMessage>(data) {
            Ok(msg) => self.handle(msg).await,
            Err(e) => {
                debug!(error = %e, "failed to decode control message");
                ControlAck::error(RoomId::default(), e.to_string())
            }
        };
        Ok(self.codec.encode(&ack)?)
    }

    /// Subscribes to a room, creating it if needed.
    pub async fn subscribe(&self, room_id: &RoomId) -> Result<EventReceiver, ArenaError> {
        Ok(self.registry.subscribe(room_id).await?)
    }

    pub fn encode_event(&self, event: &RoomEvent) -> Result<Vec<u8>, ArenaError> {
        Ok(self.codec.encode(event)?)
    }
}
