//! Room registry: creates, tracks, and routes operations to rooms.

use std::collections::HashMap;
use std::sync::Arc;

use arena_agent::{Offline, ReasoningService};
use arena_combat::RoomState;
use arena_protocol::{Action, ActorId, RoomId, StartOptions};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::room::spawn_room;
use crate::{EventReceiver, RoomConfig, RoomError, RoomHandle, RoomInfo};

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Owns every room and the reasoning service they share.
///
/// The map sits behind a `RwLock` so many tasks can look rooms up at once.
/// The lock is never held across a call into a room: handles are cloned
/// out first.
pub struct RoomRegistry<S: ReasoningService = Offline> {
    rooms: RwLock<HashMap<RoomId, RoomHandle>>,
    service: Arc<S>,
    defaults: RoomConfig,
}

impl RoomRegistry<Offline> {
    /// A registry whose rooms only ever use the heuristic.
    pub fn offline(defaults: RoomConfig) -> Self {
        Self::new(Arc::new(Offline), defaults)
    }
}

impl<S: ReasoningService> RoomRegistry<S> {
    pub fn new(service: Arc<S>, defaults: RoomConfig) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            service,
            defaults: defaults.validated(),
        }
    }

    pub fn defaults(&self) -> &RoomConfig {
        &self.defaults
    }

    pub fn service(&self) -> &Arc<S> {
        &self.service
    }

    /// Returns the room's handle, creating the room if it does not exist.
    ///
    /// A room whose actor has exited is replaced by a fresh idle one.
    pub async fn join(&self, room_id: &RoomId) -> RoomHandle {
        if let Some(handle) = self.rooms.read().await.get(room_id) {
            if !handle.is_closed() {
                return handle.clone();
            }
        }

        let mut rooms = self.rooms.write().await;
        match rooms.get(room_id) {
            Some(handle) if !handle.is_closed() => return handle.clone(),
            Some(_) => warn!(%room_id, "room actor exited, respawning"),
            None => info!(%room_id, "room created"),
        }
        let handle = spawn_room(
            room_id.clone(),
            self.defaults.clone(),
            Arc::clone(&self.service),
            DEFAULT_CHANNEL_SIZE,
        );
        rooms.insert(room_id.clone(), handle.clone());
        handle
    }

    pub async fn get(&self, room_id: &RoomId) -> Result<RoomHandle, RoomError> {
        self.rooms
            .read()
            .await
            .get(room_id)
            .cloned()
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))
    }

    /// Starts a match, creating the room first if needed.
    pub async fn start(&self, room_id: &RoomId, options: StartOptions) -> Result<(), RoomError> {
        self.join(room_id).await.start(options).await
    }

    pub async fn stop(&self, room_id: &RoomId) -> Result<(), RoomError> {
        self.get(room_id).await?.stop().await
    }

    pub async fn act(
        &self,
        room_id: &RoomId,
        actor: ActorId,
        action: Action,
    ) -> Result<(), RoomError> {
        self.get(room_id).await?.act(actor, action).await
    }

    /// Subscribes to a room's events, creating the room if needed.
    pub async fn subscribe(&self, room_id: &RoomId) -> Result<EventReceiver, RoomError> {
        self.join(room_id).await.subscribe().await
    }

    pub async fn snapshot(&self, room_id: &RoomId) -> Result<RoomState, RoomError> {
        self.get(room_id).await?.snapshot().await
    }

    pub async fn info(&self, room_id: &RoomId) -> Result<RoomInfo, RoomError> {
        self.get(room_id).await?.info().await
    }

    /// Shuts a room down and forgets it.
    pub async fn remove(&self, room_id: &RoomId) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .write()
            .await
            .remove(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;

        // A room that already exited is just as gone.
        let _ = handle.shutdown();
        info!(%room_id, "room removed");
        Ok(())
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn room_ids(&self) -> Vec<RoomId> {
        let mut ids: Vec<RoomId> = self.rooms.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}
