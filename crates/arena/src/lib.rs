//! # Arena
//!
//! Turn-based resource-combat rooms. Two seats per room take turns to
//! attack, rest, drink potions and buy gear until one of them drops to
//! zero hp. Each seat is played by a human, a local heuristic, or an
//! external reasoning service that is consulted under a hard deadline and
//! falls back to the heuristic whenever it has nothing usable to say.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use arena::prelude::*;
//!
//! # async fn run() -> Result<(), ArenaError> {
//! arena::init_tracing();
//! let settings = ArenaSettings::from_env();
//! let arena = Arena::offline(settings.room);
//!
//! let room = RoomId::default();
//! let mut events = arena.subscribe(&room).await?;
//! arena.execute(ControlMessage::Start { room_id: None, options: StartOptions::default() }).await?;
//!
//! while let Some(event) = events.recv().await {
//!     if let RoomEvent::Over { winner, .. } = event {
//!         println!("{winner} wins");
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod dispatch;
mod error;
mod settings;

pub use dispatch::Arena;
pub use error::ArenaError;
pub use settings::ArenaSettings;

/// Installs a `tracing` fmt subscriber filtered by `RUST_LOG` (default `info`).
///
/// Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub mod prelude {
    pub use crate::{Arena, ArenaError, ArenaSettings};

    pub use arena_agent::{
        AgentError, Decision, DecisionProvider, ExternalAgent, Heuristic, Offline,
        ReasoningService, Turn, TurnContext,
    };
    #[cfg(feature = "gemini")]
    pub use arena_agent::{GeminiConfig, GeminiService};
    pub use arena_combat::{
        Actor, CombatRules, DecisionSource, LogEntry, Phase, Rejection, RoomState, Shop, ShopItem,
        Stats,
    };
    pub use arena_protocol::{
        Action, ActionKind, ActorId, Codec, ControlAck, ControlMessage, HumanMode, JsonCodec,
        ProtocolError, RoomId, RulesPreset, SeatOptions, StartOptions,
    };
    pub use arena_room::{
        EventReceiver, RoomConfig, RoomError, RoomEvent, RoomHandle, RoomInfo, RoomRegistry,
    };
    pub use arena_tick::{TickConfig, TickPolicy, TickScheduler};
}
