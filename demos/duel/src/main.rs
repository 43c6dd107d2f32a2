//! Autonomous duel: both seats are machine-driven and every room event is
//! printed to stdout as one JSON line.
//!
//! Run with `cargo run -p duel`. Settings come from the environment (see
//! `ArenaSettings`). Build with `--features gemini` and set
//! `GEMINI_API_KEY` to let the external service play.

use std::io::Write;

use arena::prelude::*;
use tracing::info;

// ---------------------------------------------------------------------------
// Room wiring
// ---------------------------------------------------------------------------

#[cfg(feature = "gemini")]
async fn play(settings: ArenaSettings) -> Result<(), Box<dyn std::error::Error>> {
    use std::sync::Arc;

    match settings.gemini_config() {
        Some(config) => {
            info!(model = %config.model, "using gemini for external decisions");
            let registry = RoomRegistry::new(Arc::new(GeminiService::new(config)), settings.room);
            run(Arena::new(Arc::new(registry), JsonCodec)).await
        }
        None => run(Arena::offline(settings.room)).await,
    }
}

#[cfg(not(feature = "gemini"))]
async fn play(settings: ArenaSettings) -> Result<(), Box<dyn std::error::Error>> {
    run(Arena::offline(settings.room)).await
}

// ---------------------------------------------------------------------------
// Event loop
// ---------------------------------------------------------------------------

async fn run<S: ReasoningService>(arena: Arena<S>) -> Result<(), Box<dyn std::error::Error>> {
    let room = RoomId::default();
    let mut events = arena.subscribe(&room).await?;

    arena
        .execute(ControlMessage::Start {
            room_id: Some(room.clone()),
            options: StartOptions::default(),
        })
        .await?;

    let stdout = std::io::stdout();
    while let Some(event) = events.recv().await {
        let line = arena.encode_event(&event)?;
        {
            let mut out = stdout.lock();
            out.write_all(&line)?;
            out.write_all(b"\n")?;
        }

        match event {
            RoomEvent::Over { winner, .. } => {
                info!(%room, %winner, "duel finished");
                break;
            }
            RoomEvent::Error { code, message } => {
                info!(%room, %code, %message, "room reported an error");
                break;
            }
            _ => {}
        }
    }

    arena.registry().remove(&room).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    arena::init_tracing();
    let settings = ArenaSettings::from_env();
    info!(
        tick_ms = settings.room.tick_interval.as_millis() as u64,
        external = settings.room.use_external_agent,
        "starting duel"
    );
    play(settings).await
}
