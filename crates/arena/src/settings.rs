//! Settings read from the process environment.
//!
//! | Variable                      | Field                                   |
//! |-------------------------------|-----------------------------------------|
//! | `AI_GAME_USE_EXTERNAL`        | `room.use_external_agent` (`0`/`false` disables) |
//! | `AI_GAME_PRICE_MULT`          | `room.price_multiplier`                 |
//! | `AI_GAME_TURN_MS`             | `room.tick_interval`                    |
//! | `AI_GAME_TICK_POLICY`         | `room.tick_policy` (`after_completion`/`fixed_cadence`) |
//! | `AI_GAME_EXTERNAL_EVERY_N`    | `room.external_every_n_turns`           |
//! | `AI_GAME_EXTERNAL_MIN_MS`     | `room.external_min_interval`            |
//! | `AI_GAME_EXTERNAL_TIMEOUT_MS` | `room.external_timeout`                 |
//! | `GEMINI_API_KEY`              | `gemini_api_key`                        |
//! | `GEMINI_MODEL`                | `gemini_model`                          |
//!
//! Unset variables keep the [`RoomConfig`] defaults. Unparsable values are
//! logged and ignored. Without `AI_GAME_USE_EXTERNAL`, the external agent
//! is on exactly when an API key is present.

use std::str::FromStr;
use std::time::Duration;

use arena_room::RoomConfig;
use arena_tick::TickPolicy;
use tracing::warn;

#[derive(Debug, Clone, Default)]
pub struct ArenaSettings {
    /// Defaults for every room in the registry.
    pub room: RoomConfig,
    pub gemini_api_key: Option<String>,
    pub gemini_model: Option<String>,
}

impl ArenaSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup` instead of the real environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        let gemini_api_key = var("GEMINI_API_KEY");
        let gemini_model = var("GEMINI_MODEL");
        let mut room = RoomConfig::default();

        room.use_external_agent = match var("AI_GAME_USE_EXTERNAL") {
            Some(flag) => !matches!(flag.to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"),
            None => gemini_api_key.is_some(),
        };
        if let Some(m) = parse(&var, "AI_GAME_PRICE_MULT") {
            room.price_multiplier = m;
        }
        if let Some(ms) = parse(&var, "AI_GAME_TURN_MS") {
            room.tick_interval = Duration::from_millis(ms);
        }
        if let Some(raw) = var("AI_GAME_TICK_POLICY") {
            match raw.to_ascii_lowercase().as_str() {
                "after_completion" => room.tick_policy = TickPolicy::AfterCompletion,
                "fixed_cadence" => room.tick_policy = TickPolicy::FixedCadence,
                _ => warn!(
                    key = "AI_GAME_TICK_POLICY",
                    value = %raw,
                    "ignoring unknown tick policy"
                ),
            }
        }
        if let Some(n) = parse(&var, "AI_GAME_EXTERNAL_EVERY_N") {
            room.external_every_n_turns = n;
        }
        if let Some(ms) = parse(&var, "AI_GAME_EXTERNAL_MIN_MS") {
            room.external_min_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = parse(&var, "AI_GAME_EXTERNAL_TIMEOUT_MS") {
            room.external_timeout = Duration::from_millis(ms);
        }

        Self {
            room: room.validated(),
            gemini_api_key,
            gemini_model,
        }
    }

    /// Connection settings for the Gemini service, if a key is configured.
    #[cfg(feature = "gemini")]
    pub fn gemini_config(&self) -> Option<arena_agent::GeminiConfig> {
        let key = self.gemini_api_key.as_deref()?;
        let config = arena_agent::GeminiConfig::new(key);
        Some(match &self.gemini_model {
            Some(model) => config.with_model(model.clone()),
            None => config,
        })
    }
}

fn parse<T: FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = var(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparsable setting");
            None
        }
    }
}
