//! Room actor: an isolated Tokio task that owns one match.
//!
//! The actor owns the [`RoomState`] outright. Everything else (the registry,
//! control handlers, humans) talks to it through a [`RoomHandle`], so no
//! two turns can ever touch the state at the same time.
//!
//! A turn that needs the reasoning service is the only slow path. It runs
//! on a spawned task tagged with a token; the actor keeps serving commands
//! meanwhile and applies the result only if the token still matches. `stop`
//! aborts the task and forgets the token, so a late answer is dropped.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use arena_agent::{
    AgentSession, Decision, ExternalAgent, Heuristic, ReasoningService, Throttle, TurnContext,
    decide,
};
use arena_combat::{CombatError, CombatRules, DecisionSource, Phase, RoomState, Shop, resolver};
use arena_protocol::{Action, ActorId, HumanMode, RoomId, StartOptions};
use arena_tick::{TickInfo, TickScheduler};
use futures_util::FutureExt;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::{Broadcaster, EventReceiver, LOOP_ERROR, RoomConfig, RoomError, RoomEvent};

/// Commands sent to a room actor through its channel.
///
/// Variants carrying a `oneshot::Sender` expect a reply.
pub(crate) enum RoomCommand {
    Subscribe {
        reply: oneshot::Sender<EventReceiver>,
    },
    Start {
        options: Box<StartOptions>,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    Act {
        actor: ActorId,
        action: Action,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Snapshot {
        reply: oneshot::Sender<RoomState>,
    },
    Info {
        reply: oneshot::Sender<RoomInfo>,
    },
    Shutdown,
}

/// Room metadata (not the match itself).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub phase: Phase,
    pub round: u32,
    pub turn: ActorId,
    /// A decision is in flight.
    pub busy: bool,
    pub subscribers: usize,
    /// Ticks fired since the room was created.
    pub ticks: u64,
    /// Ticks that fired while a decision was still in flight, plus
    /// decisions a human action cancelled.
    pub dropped_ticks: u64,
}

/// Handle to a running room actor.
///
/// Cheap to clone: it is an `mpsc::Sender` and the room id.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// `true` once the actor task has exited.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Attaches a new subscriber. Its first event is the current `state`.
    pub async fn subscribe(&self) -> Result<EventReceiver, RoomError> {
        self.request(|reply| RoomCommand::Subscribe { reply }).await
    }

    /// Starts (or restarts from `summary`) a match.
    pub async fn start(&self, options: StartOptions) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Start {
            options: Box::new(options),
            reply,
        })
        .await?
    }

    /// Forces the room back to idle. Safe at any point, including mid-turn.
    pub async fn stop(&self) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Stop { reply }).await
    }

    /// Submits a human-originated action for a human seat.
    pub async fn act(&self, actor: ActorId, action: Action) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Act {
            actor,
            action,
            reply,
        })
        .await?
    }

    pub async fn snapshot(&self) -> Result<RoomState, RoomError> {
        self.request(|reply| RoomCommand::Snapshot { reply }).await
    }

    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        self.request(|reply| RoomCommand::Info { reply }).await
    }

    /// Tells the room to shut down. Pending work is cancelled.
    pub fn shutdown(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::Shutdown)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(command(reply_tx))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    fn send(&self, command: RoomCommand) -> Result<(), RoomError> {
        self.sender.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => RoomError::Busy(self.room_id.clone()),
            TrySendError::Closed(_) => RoomError::Unavailable(self.room_id.clone()),
        })
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

type SharedAgent<S> = Arc<Mutex<ExternalAgent<S>>>;

/// The result of a spawned decision task.
struct Outcome {
    token: u64,
    actor: ActorId,
    /// `Err` carries the panic message.
    result: Result<Decision, String>,
}

struct InFlight {
    token: u64,
    actor: ActorId,
    task: JoinHandle<()>,
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor<S: ReasoningService> {
    room_id: RoomId,
    /// Registry defaults; each start merges its options on top.
    defaults: RoomConfig,
    config: RoomConfig,
    state: RoomState,
    rules: CombatRules,
    rng: StdRng,
    scheduler: TickScheduler,
    service: Arc<S>,
    /// One external agent per seat, indexed by [`ActorId::index`].
    agents: [Option<SharedAgent<S>>; 2],
    broadcaster: Broadcaster,
    in_flight: Option<InFlight>,
    next_token: u64,
    receiver: mpsc::Receiver<RoomCommand>,
    outcome_tx: mpsc::UnboundedSender<Outcome>,
    outcome_rx: mpsc::UnboundedReceiver<Outcome>,
}

impl<S: ReasoningService> RoomActor<S> {
    fn new(
        room_id: RoomId,
        defaults: RoomConfig,
        service: Arc<S>,
        receiver: mpsc::Receiver<RoomCommand>,
    ) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            room_id,
            config: defaults.clone(),
            rules: defaults.rules.into(),
            defaults,
            state: RoomState::new(),
            rng: StdRng::from_os_rng(),
            scheduler: TickScheduler::event_driven(),
            service,
            agents: [None, None],
            broadcaster: Broadcaster::new(),
            in_flight: None,
            next_token: 0,
            receiver,
            outcome_tx,
            outcome_rx,
        }
    }

    /// Runs the actor loop until shutdown or until every handle is gone.
    async fn run(mut self) {
        info!(room_id = %self.room_id, "room actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(RoomCommand::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd),
                },
                Some(outcome) = self.outcome_rx.recv() => self.handle_outcome(outcome),
                tick = self.scheduler.wait_for_tick() => self.handle_tick(tick),
            }
        }

        self.cancel_in_flight();
        info!(room_id = %self.room_id, "room actor stopped");
    }

    fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Subscribe { reply } => {
                let rx = self
                    .broadcaster
                    .subscribe(RoomEvent::State(self.state.clone()));
                let _ = reply.send(rx);
            }
            RoomCommand::Start { options, reply } => {
                let _ = reply.send(self.handle_start(&options));
            }
            RoomCommand::Stop { reply } => {
                self.handle_stop();
                let _ = reply.send(());
            }
            RoomCommand::Act {
                actor,
                action,
                reply,
            } => {
                let _ = reply.send(self.handle_act(actor, action));
            }
            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(self.state.clone());
            }
            RoomCommand::Info { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::Shutdown => {}
        }
    }

    fn handle_start(&mut self, options: &StartOptions) -> Result<(), RoomError> {
        let config = self.defaults.merge(options);
        let shop = Shop::catalog().scale_prices(config.price_multiplier);
        self.state.start(&options.personal, &options.ai, shop)?;

        self.cancel_in_flight();
        self.rules = config.rules.into();
        self.rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        self.agents = self.build_agents(&config);
        self.scheduler.set_policy(config.tick_policy);
        self.scheduler.set_interval(Some(config.tick_interval));

        info!(
            room_id = %self.room_id,
            personal = %self.state.players.personal.name,
            ai = %self.state.players.ai.name,
            external = self.agents.iter().any(Option::is_some),
            tick_ms = config.tick_interval.as_millis() as u64,
            "match started"
        );
        self.config = config;
        self.broadcaster.send(RoomEvent::State(self.state.clone()));
        Ok(())
    }

    /// External agents for every seat the loop plays itself.
    fn build_agents(&self, config: &RoomConfig) -> [Option<SharedAgent<S>>; 2] {
        if !config.use_external_agent {
            return [None, None];
        }
        if !self.service.is_available() {
            warn!(room_id = %self.room_id, "external agent requested but service unavailable");
            return [None, None];
        }

        ActorId::ALL.map(|actor| {
            let seat = self.state.players.get(actor);
            if seat.human && config.human_mode == HumanMode::WaitForTurn {
                return None;
            }
            match AgentSession::seed(seat, &self.state.shop, config.price_multiplier) {
                Ok(session) => Some(Arc::new(Mutex::new(ExternalAgent::new(
                    Arc::clone(&self.service),
                    session,
                    Throttle::new(config.external_every_n_turns, config.external_min_interval),
                    config.external_timeout,
                )))),
                Err(e) => {
                    warn!(room_id = %self.room_id, %actor, error = %e, "could not seed agent session");
                    None
                }
            }
        })
    }

    fn handle_stop(&mut self) {
        self.cancel_in_flight();
        self.state.stop();
        self.scheduler.pause();
        info!(room_id = %self.room_id, "room stopped");
        self.broadcaster.send(RoomEvent::State(self.state.clone()));
    }

    fn handle_act(&mut self, actor: ActorId, action: Action) -> Result<(), RoomError> {
        if !self.state.phase.is_playing() {
            return Err(CombatError::NotPlaying(self.state.phase).into());
        }
        if !self.state.players.get(actor).human {
            return Err(RoomError::NotHumanSeat(actor));
        }
        if self.state.turn != actor {
            return Err(RoomError::NotYourTurn {
                actor,
                turn: self.state.turn,
            });
        }

        if self.in_flight.is_some() {
            debug!(room_id = %self.room_id, %actor, "human action preempts in-flight decision");
            self.cancel_in_flight();
            self.scheduler.record_dropped();
        }
        let decision = Decision::new(action, DecisionSource::Human);
        self.guarded(|room| room.apply_decision(actor, decision));

        // The next turn is due one interval after the human moved.
        if self.state.phase.is_playing() {
            self.scheduler.reset();
        }
        Ok(())
    }

    fn handle_tick(&mut self, tick: TickInfo) {
        self.guarded(|room| room.run_tick(tick));
    }

    fn run_tick(&mut self, tick: TickInfo) {
        if self.in_flight.is_some() {
            self.scheduler.record_dropped();
            return;
        }
        if !self.state.phase.is_playing() {
            self.scheduler.record_tick_end();
            self.scheduler.pause();
            return;
        }

        let actor = self.state.turn;
        trace!(room_id = %self.room_id, tick = tick.tick, %actor, "turn");

        if self.state.players.get(actor).human && self.config.human_mode == HumanMode::WaitForTurn {
            // Idle until `act` arrives.
            self.scheduler.record_tick_end();
            self.scheduler.pause();
            return;
        }

        let ctx = TurnContext::capture(&self.state, actor);
        match self.agents[actor.index()].clone() {
            Some(agent) => self.spawn_decision(actor, agent, ctx),
            None => {
                let decision = Decision::new(Heuristic::choose(&ctx), DecisionSource::Heuristic);
                self.apply_decision(actor, decision);
                self.scheduler.record_tick_end();
            }
        }
    }

    fn spawn_decision(&mut self, actor: ActorId, agent: SharedAgent<S>, ctx: TurnContext) {
        self.next_token += 1;
        let token = self.next_token;
        let outcome_tx = self.outcome_tx.clone();

        let task = tokio::spawn(async move {
            let consult = async move {
                let mut agent = agent.lock_owned().await;
                decide(Some(&mut *agent), &ctx).await
            };
            let result = AssertUnwindSafe(consult)
                .catch_unwind()
                .await
                .map_err(panic_message);
            let _ = outcome_tx.send(Outcome {
                token,
                actor,
                result,
            });
        });

        self.in_flight = Some(InFlight { token, actor, task });
    }

    fn handle_outcome(&mut self, outcome: Outcome) {
        if self.in_flight.take_if(|f| f.token == outcome.token).is_none() {
            debug!(room_id = %self.room_id, token = outcome.token, "discarding stale decision");
            return;
        }

        let decision = match outcome.result {
            Ok(decision) => decision,
            Err(panic) => {
                self.fault(format!("decision task panicked: {panic}"));
                return;
            }
        };
        if outcome.actor != self.state.turn {
            let mismatch = RoomError::TurnMismatch {
                expected: self.state.turn,
                found: outcome.actor,
            };
            self.fault(mismatch.to_string());
            return;
        }

        self.guarded(|room| {
            room.apply_decision(outcome.actor, decision);
            room.scheduler.record_tick_end();
        });
    }

    /// Runs turn work on the actor task. A panic becomes a loop fault
    /// instead of taking the actor down.
    fn guarded(&mut self, step: impl FnOnce(&mut Self)) {
        if let Err(payload) = std::panic::catch_unwind(AssertUnwindSafe(|| step(self))) {
            self.fault(format!("turn panicked: {}", panic_message(payload)));
        }
    }

    /// Resolves one action, logs it, and either ends the match or passes
    /// the turn.
    fn apply_decision(&mut self, actor: ActorId, decision: Decision) {
        let resolution = resolver::apply(
            &mut self.state,
            actor,
            &decision.action,
            &self.rules,
            &mut self.rng,
        );
        let mut entry = resolution.entry;
        entry.source = Some(decision.source);

        debug!(
            room_id = %self.room_id,
            %actor,
            round = self.state.round,
            action = %entry.action,
            source = %decision.source,
            info = %entry.info,
            "action resolved"
        );
        self.state.log.push(entry.clone());
        self.broadcaster.send(RoomEvent::Log(entry));

        if resolution.killed {
            if let Err(e) = self.state.finish(actor) {
                self.fault(e.to_string());
                return;
            }
            self.scheduler.pause();
            info!(room_id = %self.room_id, winner = %actor, round = self.state.round, "match over");
            self.broadcaster.send(RoomEvent::State(self.state.clone()));
            self.broadcaster.send(RoomEvent::Over {
                winner: actor,
                state: self.state.clone(),
            });
            return;
        }

        if let Err(e) = self.state.advance_turn() {
            self.fault(e.to_string());
            return;
        }
        self.broadcaster.send(RoomEvent::State(self.state.clone()));
    }

    /// Reports an unrecoverable tick failure and force-stops the room.
    fn fault(&mut self, message: String) {
        error!(room_id = %self.room_id, %message, "loop fault, stopping room");
        self.broadcaster.send(RoomEvent::Error {
            code: LOOP_ERROR.to_owned(),
            message,
        });
        self.handle_stop();
    }

    fn cancel_in_flight(&mut self) {
        if let Some(flight) = self.in_flight.take() {
            flight.task.abort();
            debug!(
                room_id = %self.room_id,
                token = flight.token,
                actor = %flight.actor,
                "in-flight decision cancelled"
            );
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id.clone(),
            phase: self.state.phase,
            round: self.state.round,
            turn: self.state.turn,
            busy: self.in_flight.is_some(),
            subscribers: self.broadcaster.len(),
            ticks: self.scheduler.tick_count(),
            dropped_ticks: self.scheduler.metrics().total_dropped,
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}

/// Spawns a new room actor task and returns a handle to communicate with it.
///
/// `channel_size` bounds the command queue. A full queue makes handle
/// calls fail with [`RoomError::Busy`] instead of waiting.
pub(crate) fn spawn_room<S: ReasoningService>(
    room_id: RoomId,
    defaults: RoomConfig,
    service: Arc<S>,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);
    let actor = RoomActor::new(room_id.clone(), defaults, service, rx);
    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
    }
}
