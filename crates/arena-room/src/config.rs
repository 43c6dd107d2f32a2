//! Room configuration.

use std::time::Duration;

use arena_protocol::{HumanMode, RulesPreset, StartOptions};
use arena_tick::{TickConfig, TickPolicy};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Settings for one match.
///
/// The registry holds a default `RoomConfig`; each `start` overlays its
/// [`StartOptions`] on top with [`RoomConfig::merge`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Consult the reasoning service before falling back to the heuristic.
    /// Ignored when the service reports itself unavailable.
    pub use_external_agent: bool,

    /// Delay between the end of one turn and the start of the next.
    pub tick_interval: Duration,

    /// `AfterCompletion` waits for a slow turn. `FixedCadence` keeps the
    /// beat and drops ticks that land while a decision is in flight.
    pub tick_policy: TickPolicy,

    /// Only every Nth turn of a seat is sent to the reasoning service.
    pub external_every_n_turns: u32,

    /// Minimum spacing between successful calls for one seat.
    pub external_min_interval: Duration,

    /// Hard deadline for one call.
    pub external_timeout: Duration,

    /// Applied to every catalog price: `max(1, round(price * m))`.
    pub price_multiplier: f64,

    pub human_mode: HumanMode,

    pub rules: RulesPreset,

    /// Seed for the room's random generator. `None` seeds from the OS.
    pub rng_seed: Option<u64>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            use_external_agent: false,
            tick_interval: Duration::from_millis(2500),
            tick_policy: TickPolicy::AfterCompletion,
            external_every_n_turns: 2,
            external_min_interval: Duration::from_millis(5000),
            external_timeout: Duration::from_millis(4000),
            price_multiplier: 0.35,
            human_mode: HumanMode::WaitForTurn,
            rules: RulesPreset::Generous,
            rng_seed: None,
        }
    }
}

impl RoomConfig {
    /// Longest supported tick interval.
    pub const MAX_TICK_INTERVAL: Duration = Duration::from_secs(600);

    /// Overlays the options given to `start`. Absent options keep `self`'s value.
    pub fn merge(&self, options: &StartOptions) -> Self {
        Self {
            use_external_agent: options.use_external_agent.unwrap_or(self.use_external_agent),
            tick_interval: options
                .tick_interval_ms
                .map_or(self.tick_interval, Duration::from_millis),
            tick_policy: self.tick_policy,
            external_every_n_turns: options
                .external_every_n_turns
                .unwrap_or(self.external_every_n_turns),
            external_min_interval: options
                .external_min_interval_ms
                .map_or(self.external_min_interval, Duration::from_millis),
            external_timeout: options
                .external_timeout_ms
                .map_or(self.external_timeout, Duration::from_millis),
            price_multiplier: options.price_multiplier.unwrap_or(self.price_multiplier),
            human_mode: options.human_mode.unwrap_or(self.human_mode),
            rules: options.rules.unwrap_or(self.rules),
            rng_seed: options.rng_seed.or(self.rng_seed),
        }
        .validated()
    }

    /// Clamp and fix any out-of-range values.
    ///
    /// - `tick_interval` kept within [`TickConfig::MIN_INTERVAL`] and
    ///   [`Self::MAX_TICK_INTERVAL`].
    /// - `external_every_n_turns` raised to 1.
    /// - `external_timeout` of zero replaced by the default.
    /// - A non-finite or non-positive `price_multiplier` replaced by the default.
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();

        if self.tick_interval < TickConfig::MIN_INTERVAL {
            warn!(
                tick_interval_ms = self.tick_interval.as_millis() as u64,
                min_ms = TickConfig::MIN_INTERVAL.as_millis() as u64,
                "tick interval below minimum, clamping"
            );
            self.tick_interval = TickConfig::MIN_INTERVAL;
        }
        if self.tick_interval > Self::MAX_TICK_INTERVAL {
            warn!(
                tick_interval_ms = self.tick_interval.as_millis() as u64,
                max_ms = Self::MAX_TICK_INTERVAL.as_millis() as u64,
                "tick interval above maximum, clamping"
            );
            self.tick_interval = Self::MAX_TICK_INTERVAL;
        }
        if self.external_every_n_turns == 0 {
            warn!("external_every_n_turns is 0, using 1");
            self.external_every_n_turns = 1;
        }
        if self.external_timeout.is_zero() {
            warn!(
                default_ms = defaults.external_timeout.as_millis() as u64,
                "external_timeout is 0, using default"
            );
            self.external_timeout = defaults.external_timeout;
        }
        if !self.price_multiplier.is_finite() || self.price_multiplier <= 0.0 {
            warn!(
                price_multiplier = self.price_multiplier,
                default = defaults.price_multiplier,
                "invalid price multiplier, using default"
            );
            self.price_multiplier = defaults.price_multiplier;
        }
        self
    }
}
