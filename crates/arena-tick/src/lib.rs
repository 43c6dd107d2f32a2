//! Fixed-delay tick scheduler for Arena rooms.
//!
//! A room asks the scheduler when its next turn is due, does the turn's
//! work (which may include a slow external call), then reports back. The
//! scheduler supports two cadences, pause/resume, first-tick jitter and
//! budget monitoring.
//!
//! # Event-driven mode
//!
//! When the interval is `None`, [`TickScheduler::wait_for_tick`] pends
//! forever. Idle rooms sit in this mode until a match starts.
//!
//! # Integration
//!
//! The scheduler sits inside a room actor's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         tick = scheduler.wait_for_tick() => {
//!             run_turn(tick).await;
//!             scheduler.record_tick_end();
//!         }
//!     }
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// When the tick after a given one becomes due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickPolicy {
    /// One interval after the previous tick's work finished
    /// ([`TickScheduler::record_tick_end`]). No tick fires while one is
    /// still in progress, so slow work stretches the cadence.
    #[default]
    AfterCompletion,
    /// One interval after the previous tick was due, whether or not its
    /// work finished. Deadlines missed entirely are skipped, not replayed.
    /// Ticks that fire while the caller is still busy should be reported
    /// with [`TickScheduler::record_dropped`].
    FixedCadence,
}

/// Full configuration for the tick scheduler.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Delay between ticks. `None` = event-driven (tick never fires).
    pub interval: Option<Duration>,
    pub policy: TickPolicy,
    /// Budget warning threshold (0.0–1.0). Default: 0.80 (80%).
    /// A tracing warning is emitted when a tick's work exceeds this
    /// fraction of the interval.
    pub budget_warn_threshold: f64,
    /// Budget critical threshold (0.0–1.0). Default: 1.0 (100%).
    pub budget_critical_threshold: f64,
    pub metrics_enabled: bool,
    /// Random jitter (0–max µs) added to the *first* tick so rooms started
    /// at the same instant do not tick in lockstep.
    pub initial_jitter_us: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            interval: None,
            policy: TickPolicy::default(),
            budget_warn_threshold: 0.80,
            budget_critical_threshold: 1.0,
            metrics_enabled: true,
            initial_jitter_us: 2_000,
        }
    }
}

impl TickConfig {
    /// Shortest supported interval.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(10);

    /// A config ticking every `interval` with default settings.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval: Some(interval),
            ..Default::default()
        }
    }

    /// Clamp and fix any out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`TickScheduler::new`]. Rules:
    /// - `interval` raised to at least [`Self::MIN_INTERVAL`].
    /// - Thresholds clamped to `0.0..=1.0`.
    /// - `budget_warn_threshold` forced ≤ `budget_critical_threshold`.
    pub fn validated(mut self) -> Self {
        if let Some(interval) = self.interval {
            if interval < Self::MIN_INTERVAL {
                warn!(
                    interval_ms = interval.as_millis() as u64,
                    min_ms = Self::MIN_INTERVAL.as_millis() as u64,
                    "tick interval below minimum, clamping"
                );
                self.interval = Some(Self::MIN_INTERVAL);
            }
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self.budget_critical_threshold = self.budget_critical_threshold.clamp(0.0, 1.0);
        if self.budget_warn_threshold > self.budget_critical_threshold {
            self.budget_warn_threshold = self.budget_critical_threshold;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Tick info
// ---------------------------------------------------------------------------

/// Information about a fired tick, returned by [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Monotonically increasing tick number (starts at 1).
    pub tick: u64,
    pub interval: Duration,
    /// How far past its deadline the tick fired.
    pub late_by: Duration,
    /// Deadlines skipped because the loop was late (`FixedCadence` only).
    pub ticks_skipped: u64,
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Runtime metrics for the tick scheduler.
///
/// Timing values refer to the work between [`TickScheduler::wait_for_tick`]
/// returning and [`TickScheduler::record_tick_end`].
#[derive(Debug, Clone, Default)]
pub struct TickMetrics {
    pub total_ticks: u64,
    /// Ticks the caller ignored because it was still busy.
    pub total_dropped: u64,
    pub total_skipped: u64,
    /// Exponential moving average of tick work time (α = 0.1).
    pub avg_tick_time: Duration,
    pub max_tick_time: Duration,
    /// Last tick's work time over the interval. >1.0 means overrun.
    pub budget_utilization: f64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-delay tick scheduler. One per room actor.
pub struct TickScheduler {
    config: TickConfig,
    tick_count: u64,
    /// When the next tick should fire. `None` while an `AfterCompletion`
    /// tick is in progress.
    next_tick: Option<Instant>,
    /// When the current tick fired. Consumed by `record_tick_end`.
    tick_start: Option<Instant>,
    paused: bool,
    metrics: TickMetrics,
}

impl TickScheduler {
    /// Create a new scheduler from config. The first tick is due one
    /// interval (plus jitter) from now.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();

        match config.interval {
            None => debug!("tick scheduler created in event-driven mode"),
            Some(interval) => debug!(
                interval_ms = interval.as_millis() as u64,
                policy = ?config.policy,
                "tick scheduler created"
            ),
        }

        let mut scheduler = Self {
            config,
            tick_count: 0,
            next_tick: None,
            tick_start: None,
            paused: false,
            metrics: TickMetrics::default(),
        };
        scheduler.next_tick = scheduler.first_deadline();
        scheduler
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self::new(TickConfig::with_interval(interval))
    }

    /// A scheduler that never fires.
    pub fn event_driven() -> Self {
        Self::new(TickConfig::default())
    }

    /// Wait until the next tick is due.
    ///
    /// In event-driven mode, when paused, or while an `AfterCompletion`
    /// tick is still in progress, this future pends forever. `tokio::select!`
    /// keeps processing its other branches.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let (next, interval) = match (self.next_tick, self.config.interval) {
            (Some(next), Some(interval)) if !self.paused => (next, interval),
            _ => std::future::pending().await,
        };

        time::sleep_until(next).await;

        let now = Instant::now();
        self.tick_count += 1;
        self.tick_start = Some(now);
        let late_by = now.saturating_duration_since(next);
        let mut ticks_skipped = 0;

        self.next_tick = match self.config.policy {
            TickPolicy::AfterCompletion => None,
            TickPolicy::FixedCadence => {
                ticks_skipped = (late_by.as_nanos() / interval.as_nanos()) as u64;
                if ticks_skipped > 0 {
                    warn!(
                        tick = self.tick_count,
                        skipped = ticks_skipped,
                        late_ms = late_by.as_millis() as u64,
                        "tick overrun, skipping ahead"
                    );
                }
                Some(next + interval * (ticks_skipped as u32 + 1))
            }
        };

        self.metrics.total_ticks += 1;
        self.metrics.total_skipped += ticks_skipped;
        trace!(tick = self.tick_count, late_ms = late_by.as_millis() as u64, "tick fired");

        TickInfo {
            tick: self.tick_count,
            interval,
            late_by,
            ticks_skipped,
        }
    }

    /// Record that the work for the current tick has finished.
    ///
    /// Under `AfterCompletion` this schedules the next tick one interval
    /// from now. Also feeds budget monitoring and metrics.
    pub fn record_tick_end(&mut self) {
        let Some(start) = self.tick_start.take() else {
            return;
        };
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(start);

        let Some(interval) = self.config.interval else {
            return;
        };
        if self.config.policy == TickPolicy::AfterCompletion && !self.paused {
            self.next_tick = Some(now + interval);
        }

        let utilization = elapsed.as_secs_f64() / interval.as_secs_f64();
        self.metrics.budget_utilization = utilization;
        if utilization >= self.config.budget_critical_threshold {
            warn!(
                tick = self.tick_count,
                elapsed_ms = elapsed.as_millis() as u64,
                budget_ms = interval.as_millis() as u64,
                utilization_pct = format!("{:.1}", utilization * 100.0),
                "CRITICAL: tick exceeded budget"
            );
        } else if utilization >= self.config.budget_warn_threshold {
            warn!(
                tick = self.tick_count,
                elapsed_ms = elapsed.as_millis() as u64,
                budget_ms = interval.as_millis() as u64,
                utilization_pct = format!("{:.1}", utilization * 100.0),
                "tick approaching budget limit"
            );
        }

        if self.config.metrics_enabled {
            if elapsed > self.metrics.max_tick_time {
                self.metrics.max_tick_time = elapsed;
            }
            let alpha = 0.1;
            let prev = self.metrics.avg_tick_time.as_secs_f64();
            let curr = elapsed.as_secs_f64();
            self.metrics.avg_tick_time =
                Duration::from_secs_f64(prev * (1.0 - alpha) + curr * alpha);
        }
    }

    /// Record a tick that fired while the caller was still busy and was
    /// ignored. The in-progress tick keeps its own start time.
    pub fn record_dropped(&mut self) {
        self.metrics.total_dropped += 1;
        trace!(tick = self.tick_count, "tick dropped while busy");
    }

    /// Pause the tick loop. `wait_for_tick` will pend until [`resume`](Self::resume)
    /// or [`reset`](Self::reset) is called.
    ///
    /// Safe to call multiple times (idempotent).
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(tick = self.tick_count, "tick scheduler paused");
        }
    }

    /// Resume after a pause. The next tick is due one interval from now,
    /// so time spent paused does not produce a burst.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.tick_start = None;
            self.next_tick = self.config.interval.map(|d| Instant::now() + d);
            debug!(tick = self.tick_count, "tick scheduler resumed");
        }
    }

    /// Unpause, forget any in-progress tick and schedule the first tick
    /// again (with jitter). Counters and metrics are kept.
    pub fn reset(&mut self) {
        self.paused = false;
        self.tick_start = None;
        self.next_tick = self.first_deadline();
        debug!(tick = self.tick_count, "tick scheduler reset");
    }

    /// Switch to a new interval and restart the cadence from now.
    /// `None` enters event-driven mode.
    pub fn set_interval(&mut self, interval: Option<Duration>) {
        let mut config = self.config.clone();
        config.interval = interval;
        self.config = config.validated();
        self.reset();
    }

    /// Switch cadence policy. Takes effect from the next deadline computed,
    /// so callers usually follow it with [`reset`](Self::reset) or
    /// [`set_interval`](Self::set_interval).
    pub fn set_policy(&mut self, policy: TickPolicy) {
        if self.config.policy != policy {
            debug!(from = ?self.config.policy, to = ?policy, "tick policy changed");
            self.config.policy = policy;
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_event_driven(&self) -> bool {
        self.config.interval.is_none()
    }

    /// `true` between a tick firing and its [`record_tick_end`](Self::record_tick_end).
    pub fn in_tick(&self) -> bool {
        self.tick_start.is_some()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn metrics(&self) -> &TickMetrics {
        &self.metrics
    }

    pub fn interval(&self) -> Option<Duration> {
        self.config.interval
    }

    pub fn policy(&self) -> TickPolicy {
        self.config.policy
    }

    fn first_deadline(&self) -> Option<Instant> {
        self.config.interval.map(|d| {
            let jitter = if self.config.initial_jitter_us > 0 {
                let us = rand::rng().random_range(0..self.config.initial_jitter_us);
                Duration::from_micros(us)
            } else {
                Duration::ZERO
            };
            Instant::now() + d + jitter
        })
    }
}
