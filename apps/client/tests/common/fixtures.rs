//! Session fixtures
//!
//! [`SessionHarness`] starts a real session against a [`ScriptedGateway`] and
//! a [`MockConnector`]. Tests run on paused time, so every timer advances as
//! soon as the runtime is idle.

use std::sync::Arc;
use std::time::Duration;

use quizsync_client::{
    MemoryCredentialStore, QuizSession, SessionCredentials, SessionDeps, SessionEvent,
    SessionHandle,
};
use quizsync_gateway_client::{Question, Quiz};
use quizsync_shared_config::SessionTiming;
use quizsync_test_utils::ScriptedGateway;
use tokio::sync::mpsc;

use super::mocks::{Attempt, MockConnector, ServerLink};

pub const PARTICIPANT_ID: u64 = 2024001;
pub const SESSION_CODE: &str = "QUIZ42";
pub const PUSH_URL: &str = "ws://quiz.test";

/// Countdown of every question built by [`quiz_of`]
pub const QUESTION_DURATION: Duration = Duration::from_secs(11);

/// Upper bound for waiting on a single event
const EVENT_TIMEOUT: Duration = Duration::from_secs(600);

pub fn credentials() -> SessionCredentials {
    SessionCredentials::new(PARTICIPANT_ID, SESSION_CODE)
}

/// A quiz of `n` short questions; even indices are true
pub fn quiz_of(n: usize) -> Quiz {
    Quiz::new(
        (0..n)
            .map(|i| Question::new(format!("Question {}", i), i % 2 == 0))
            .collect(),
    )
}

/// A running session and the fakes behind it
pub struct SessionHarness {
    pub handle: SessionHandle,
    pub events: mpsc::Receiver<SessionEvent>,
    pub gateway: ScriptedGateway,
    pub connector: Arc<MockConnector>,
    pub links: mpsc::UnboundedReceiver<ServerLink>,
    pub store: Arc<MemoryCredentialStore>,
}

impl SessionHarness {
    /// Start a session whose push channel accepts every connect
    pub fn start(quiz: Quiz) -> Self {
        Self::start_with(quiz, MockConnector::accepting(), SessionTiming::default())
    }

    /// Start a session whose push channel never opens
    pub fn start_offline(quiz: Quiz) -> Self {
        Self::start_with(
            quiz,
            MockConnector::scripted(Vec::new(), Attempt::Refuse),
            SessionTiming::default(),
        )
    }

    pub fn start_with(
        quiz: Quiz,
        (connector, links): (Arc<MockConnector>, mpsc::UnboundedReceiver<ServerLink>),
        timing: SessionTiming,
    ) -> Self {
        let gateway = ScriptedGateway::with_quiz(quiz.clone());
        let store = Arc::new(MemoryCredentialStore::new(
            PARTICIPANT_ID.to_string(),
            SESSION_CODE,
        ));

        let deps = SessionDeps {
            gateway: Arc::new(gateway.clone()),
            connector: connector.clone(),
            credential_store: store.clone(),
            websocket_url: PUSH_URL.to_string(),
            timing,
        };
        let (handle, events) = QuizSession::start(deps, credentials(), quiz);

        Self {
            handle,
            events,
            gateway,
            connector,
            links,
            store,
        }
    }

    /// Next event of any kind
    pub async fn next_event(&mut self) -> SessionEvent {
        tokio::time::timeout(EVENT_TIMEOUT, self.events.recv())
            .await
            .expect("timed out waiting for a session event")
            .expect("session event channel closed")
    }

    /// Skip events until one matches `pred`
    pub async fn wait_for(&mut self, pred: impl Fn(&SessionEvent) -> bool) -> SessionEvent {
        loop {
            let event = self.next_event().await;
            if pred(&event) {
                return event;
            }
        }
    }

    /// Collect events until one matches `pred`, inclusive
    pub async fn collect_until(
        &mut self,
        pred: impl Fn(&SessionEvent) -> bool,
    ) -> Vec<SessionEvent> {
        let mut seen = Vec::new();
        loop {
            let event = self.next_event().await;
            let done = pred(&event);
            seen.push(event);
            if done {
                return seen;
            }
        }
    }

    /// Events already queued, without waiting
    pub fn drain(&mut self) -> Vec<SessionEvent> {
        let mut seen = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            seen.push(event);
        }
        seen
    }

    /// Server end of the next link the session opens
    pub async fn server_link(&mut self) -> ServerLink {
        tokio::time::timeout(EVENT_TIMEOUT, self.links.recv())
            .await
            .expect("timed out waiting for the push channel")
            .expect("connector dropped")
    }
}
