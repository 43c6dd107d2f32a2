//! Per-seat limits on how often the external service is consulted.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

/// Why a turn was not sent to the external service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Only every Nth turn of a seat is eligible.
    NotNthTurn { turn: u64, every_n: u32 },
    /// The last successful call was too recent.
    TooSoon { remaining: Duration },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotNthTurn { turn, every_n } => {
                write!(f, "turn {turn} is not a multiple of {every_n}")
            }
            Self::TooSoon { remaining } => write!(f, "next call allowed in {remaining:?}"),
        }
    }
}

/// Counts a seat's turns and remembers its last successful call.
///
/// Uses [`tokio::time::Instant`] so paused-clock tests can drive it.
#[derive(Debug, Clone)]
pub struct Throttle {
    every_n: u32,
    min_interval: Duration,
    turns: u64,
    last_success: Option<Instant>,
}

impl Throttle {
    /// `every_n` below 1 is treated as 1 (every turn).
    pub fn new(every_n: u32, min_interval: Duration) -> Self {
        Self {
            every_n: every_n.max(1),
            min_interval,
            turns: 0,
            last_success: None,
        }
    }

    /// Counts one turn and decides whether it may be sent.
    pub fn admit(&mut self, now: Instant) -> Result<(), SkipReason> {
        self.turns += 1;
        if self.every_n > 1 && self.turns % u64::from(self.every_n) != 0 {
            return Err(SkipReason::NotNthTurn {
                turn: self.turns,
                every_n: self.every_n,
            });
        }
        if let Some(last) = self.last_success {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.min_interval {
                return Err(SkipReason::TooSoon {
                    remaining: self.min_interval - elapsed,
                });
            }
        }
        Ok(())
    }

    pub fn record_success(&mut self, now: Instant) {
        self.last_success = Some(now);
    }

    /// Turns counted so far.
    pub fn turns(&self) -> u64 {
        self.turns
    }
}
