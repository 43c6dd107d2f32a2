//! External agent behavior against scripted reasoning services.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use arena_agent::{
    AgentError, AgentSession, Consultation, ExternalAgent, Offline, ReasoningService, SkipReason,
    Throttle, Turn, TurnContext, decide,
};
use arena_combat::{DecisionSource, RoomState, Shop};
use arena_protocol::{Action, ActorId, ProtocolError, SeatOptions};

/// Replies from a queue, optionally after a delay. Counts calls.
#[derive(Default)]
struct Scripted {
    replies: Mutex<VecDeque<String>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl Scripted {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            ..Self::default()
        })
    }

    fn slow(reply: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::from([reply.to_string()])),
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ReasoningService for Scripted {
    async fn complete(&self, _history: &[Turn], _prompt: &Turn) -> Result<String, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AgentError::Transport("script exhausted".into()))
    }
}

fn room() -> RoomState {
    let mut state = RoomState::new();
    state
        .start(&SeatOptions::default(), &SeatOptions::default(), Shop::catalog())
        .unwrap();
    state
}

fn agent<S: ReasoningService>(service: Arc<S>, throttle: Throttle) -> ExternalAgent<S> {
    let state = room();
    let session = AgentSession::seed(&state.players.ai, &state.shop, 1.0).unwrap();
    ExternalAgent::new(service, session, throttle, Duration::from_millis(4000))
}

fn every_turn() -> Throttle {
    Throttle::new(1, Duration::ZERO)
}

fn ctx() -> TurnContext {
    TurnContext::capture(&room(), ActorId::Ai)
}

#[tokio::test(start_paused = true)]
async fn test_valid_reply_is_decided_and_committed() {
    let service = Scripted::new(&[r#"{"action":"REST","details":{}}"#]);
    let mut agent = agent(service.clone(), every_turn());

    let outcome = agent.consult(&ctx()).await;

    assert!(matches!(outcome, Consultation::Decided(Action::Rest)));
    assert_eq!(service.calls(), 1);
    assert_eq!(agent.session().transcript().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_action_fails_and_falls_back_to_heuristic() {
    let service = Scripted::new(&[r#"{"action":"FLY"}"#]);
    let mut agent = agent(service, every_turn());

    let outcome = agent.consult(&ctx()).await;
    assert!(matches!(
        outcome,
        Consultation::Failed(AgentError::Invalid(ProtocolError::InvalidAction(_)))
    ));

    let service = Scripted::new(&[r#"{"action":"FLY"}"#]);
    let mut agent = self::agent(service, every_turn());
    let decision = decide(Some(&mut agent), &ctx()).await;
    assert_eq!(decision.source, DecisionSource::Heuristic);
    assert_eq!(decision.action, Action::Attack);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_leaves_transcript_untouched() {
    let service = Scripted::slow(r#"{"action":"REST","details":{}}"#, Duration::from_secs(10));
    let mut agent = agent(service.clone(), every_turn());

    let outcome = agent.consult(&ctx()).await;

    assert!(matches!(outcome, Consultation::Failed(AgentError::Timeout(d)) if d == Duration::from_millis(4000)));
    assert_eq!(service.calls(), 1);
    assert_eq!(agent.session().transcript().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_every_nth_turn_skips_without_calling() {
    let service = Scripted::new(&[r#"{"action":"ATTACK","details":{}}"#]);
    let mut agent = agent(service.clone(), Throttle::new(2, Duration::ZERO));

    let first = agent.consult(&ctx()).await;
    assert!(matches!(first, Consultation::Skipped(SkipReason::NotNthTurn { turn: 1, every_n: 2 })));
    assert_eq!(service.calls(), 0);

    let second = agent.consult(&ctx()).await;
    assert!(matches!(second, Consultation::Decided(Action::Attack)));
    assert_eq!(service.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_min_interval_after_success() {
    let service = Scripted::new(&[
        r#"{"action":"ATTACK","details":{}}"#,
        r#"{"action":"REST","details":{}}"#,
    ]);
    let mut agent = agent(service.clone(), Throttle::new(1, Duration::from_secs(5)));

    assert!(matches!(agent.consult(&ctx()).await, Consultation::Decided(_)));
    assert!(matches!(
        agent.consult(&ctx()).await,
        Consultation::Skipped(SkipReason::TooSoon { .. })
    ));

    tokio::time::advance(Duration::from_secs(5)).await;
    assert!(matches!(agent.consult(&ctx()).await, Consultation::Decided(Action::Rest)));
    assert_eq!(service.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_unresolvable_potion_is_no_decision() {
    let service = Scripted::new(&[r#"{"action":"DRINK_POTION","details":{"potion_id":"potion_003"}}"#]);
    let mut agent = agent(service, every_turn());

    let outcome = agent.consult(&ctx()).await;
    assert!(matches!(outcome, Consultation::Failed(AgentError::Unresolved(id)) if id == "potion_003"));
}

#[tokio::test(start_paused = true)]
async fn test_prose_wrapped_reply_is_accepted() {
    let service = Scripted::new(&["Here you go:\n```json\n{\"action\":\"BUY_ITEM\",\"details\":{\"item_id\":\"item_005\"}}\n```"]);
    let mut agent = agent(service, every_turn());

    let decision = decide(Some(&mut agent), &ctx()).await;
    assert_eq!(decision.source, DecisionSource::External);
    assert_eq!(
        decision.action,
        Action::BuyItem {
            item_id: "item_005".into()
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_offline_service_is_unavailable() {
    let mut agent = agent(Arc::new(Offline), every_turn());
    assert!(!Offline.is_available());
    assert!(matches!(
        agent.consult(&ctx()).await,
        Consultation::Failed(AgentError::Unavailable)
    ));
}
