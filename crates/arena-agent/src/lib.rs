//! Decision providers for Arena.
//!
//! A room asks for one [`Action`](arena_protocol::Action) per tick. Two
//! providers can answer:
//!
//! - [`Heuristic`]: local, synchronous, always answers
//! - [`ExternalAgent`]: a throttled conversation with a [`ReasoningService`],
//!   raced against a deadline; may answer nothing
//!
//! [`decide`] tries the external agent first and falls back to the heuristic
//! whenever it yields no decision.
//!
//! # Feature Flags
//!
//! - `gemini`: [`GeminiService`], a `generateContent` client via `reqwest`

mod context;
mod error;
mod external;
#[cfg(feature = "gemini")]
mod gemini;
mod heuristic;
mod provider;
mod service;
mod session;
mod throttle;

pub use context::TurnContext;
pub use error::AgentError;
pub use external::{Consultation, ExternalAgent, sanitize};
#[cfg(feature = "gemini")]
pub use gemini::{GeminiConfig, GeminiService};
pub use heuristic::Heuristic;
pub use provider::{Decision, DecisionProvider, decide};
pub use service::{Offline, ReasoningService};
pub use session::{AgentSession, Role, Turn, TurnDelta};
pub use throttle::{SkipReason, Throttle};
