//! Session driver
//!
//! A single task owns every piece of session state: the countdown, the
//! reconciliation progress, the answer book, the push channel subscription and
//! all spawned I/O. Server reads run as spawned tasks whose results are fed
//! back into [`reconcile`], so the loop never blocks on the network and every
//! trigger funnels through the same reducer.

use std::future;
use std::sync::Arc;
use std::time::Duration;

use quizsync_gateway_client::{GatewayResult, QuestionId, Quiz, ServerGateway};
use quizsync_shared_config::SessionTiming;
use tokio::sync::{mpsc, watch};
use tokio::task::{AbortHandle, JoinSet};
use tokio::time::{interval_at, sleep_until, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::connection::{
    ConnectionManager, ConnectionState, Connector, PushMessage, ReconnectPolicy,
};
use crate::credentials::{CredentialStore, SessionCredentials};
use crate::error::{ClientError, ClientResult};
use crate::leaderboard::{LeaderboardPoller, LeaderboardSnapshot};
use crate::position::Position;
use crate::reconcile::{reconcile, AnswerBook, AnswerRecord, Progress, Transition};
use crate::timer::SessionTimer;

const EVENT_CAPACITY: usize = 128;
const COMMAND_CAPACITY: usize = 32;

/// Collaborators a session runs against
#[derive(Clone)]
pub struct SessionDeps {
    pub gateway: Arc<dyn ServerGateway>,
    pub connector: Arc<dyn Connector>,
    pub credential_store: Arc<dyn CredentialStore>,
    pub websocket_url: String,
    pub timing: SessionTiming,
}

/// Everything a front end needs to render the session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    QuestionStarted { index: usize, duration: Duration },
    TimeUp { index: usize, selected: Option<bool> },
    Advanced { from: usize, to: usize },
    Finished,
    ShowStandings,
    ReturnToQuestion,
    Position(Position),
    Connection(ConnectionState),
    /// The push channel is gone for good; progress now relies on polling
    PushDegraded,
    OwnScore(u32),
    Leaderboard(LeaderboardSnapshot),
    /// Last event of every session
    Ended,
}

#[derive(Debug)]
enum Command {
    Select(Option<bool>),
    StandingsDismissed,
}

/// Control side of a running session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    shutdown: CancellationToken,
}

impl SessionHandle {
    /// Select an answer for the current question; `None` clears it
    pub async fn select_answer(&self, answer: Option<bool>) -> ClientResult<()> {
        self.send(Command::Select(answer)).await
    }

    /// The standings view was closed by the user
    pub async fn standings_dismissed(&self) -> ClientResult<()> {
        self.send(Command::StandingsDismissed).await
    }

    /// End the session; safe to call more than once
    pub fn exit(&self) {
        self.shutdown.cancel();
    }

    /// Whether the driver has stopped
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Wait until the driver has stopped
    pub async fn closed(&self) {
        self.commands.closed().await
    }

    async fn send(&self, command: Command) -> ClientResult<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| ClientError::SessionClosed)
    }
}

/// Entry point for running a quiz session
pub struct QuizSession;

impl QuizSession {
    /// Spawn the driver; the push channel starts connecting immediately
    pub fn start(
        deps: SessionDeps,
        credentials: SessionCredentials,
        quiz: Quiz,
    ) -> (SessionHandle, mpsc::Receiver<SessionEvent>) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CAPACITY);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let shutdown = CancellationToken::new();

        let mut connection = ConnectionManager::spawn(
            deps.websocket_url.clone(),
            deps.connector.clone(),
            ReconnectPolicy::from_timing(&deps.timing),
            deps.timing.keepalive,
        );
        let connection_state = connection.subscribe_state();
        let push_messages = connection.take_messages();

        let mut poll = interval_at(
            Instant::now() + deps.timing.poll_interval,
            deps.timing.poll_interval,
        );
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let driver = Driver {
            progress: Progress::new(quiz.len()),
            answers: AnswerBook::new(),
            timer: None,
            connection: Some(connection),
            connection_state: Some(connection_state),
            push_messages,
            poll,
            degraded: false,
            standings_showing: false,
            position_task: None,
            io: JoinSet::new(),
            leaderboard: None,
            events: event_tx,
            detached: false,
            commands: command_rx,
            shutdown: shutdown.clone(),
            deps,
            credentials,
            quiz,
        };
        tokio::spawn(driver.run());

        (
            SessionHandle {
                commands: command_tx,
                shutdown,
            },
            event_rx,
        )
    }
}

/// Results of spawned I/O, fed back into the driver loop
enum IoOutcome {
    ServerIndex(GatewayResult<usize>),
    Position {
        /// Question the lookup belongs to; `None` for the standings view
        question_index: Option<usize>,
        position: Position,
    },
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitReason {
    User,
    Detached,
}

struct Driver {
    deps: SessionDeps,
    credentials: SessionCredentials,
    quiz: Quiz,
    progress: Progress,
    answers: AnswerBook,
    timer: Option<SessionTimer>,
    connection: Option<ConnectionManager>,
    connection_state: Option<watch::Receiver<ConnectionState>>,
    push_messages: Option<mpsc::Receiver<PushMessage>>,
    poll: Interval,
    degraded: bool,
    standings_showing: bool,
    position_task: Option<AbortHandle>,
    io: JoinSet<IoOutcome>,
    leaderboard: Option<LeaderboardPoller>,
    events: mpsc::Sender<SessionEvent>,
    detached: bool,
    commands: mpsc::Receiver<Command>,
    shutdown: CancellationToken,
}

impl Driver {
    async fn run(mut self) {
        info!(
            participant_id = self.credentials.participant_id,
            session_code = %self.credentials.session_code,
            questions = self.quiz.len(),
            "Quiz session started"
        );

        self.spawn_join("session start");
        self.start_question(0).await;

        let reason = loop {
            let deadline = self
                .timer
                .as_ref()
                .filter(|t| !t.time_is_over())
                .map(SessionTimer::deadline);
            let poll_enabled = self.poll_enabled();
            let has_io = !self.io.is_empty();

            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => break ExitReason::User,

                Some(command) = self.commands.recv() => self.on_command(command),

                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.on_time_up().await;
                }

                Some(message) = next_push(&mut self.push_messages) => self.on_push(message).await,

                Some(state) = next_state(&mut self.connection_state) => {
                    self.on_connection_state(state).await;
                }

                _ = self.poll.tick(), if poll_enabled => self.spawn_index_read("poll"),

                Some(joined) = self.io.join_next(), if has_io => match joined {
                    Ok(outcome) => self.on_io(outcome).await,
                    Err(e) if e.is_cancelled() => {}
                    Err(e) => warn!(error = %e, "Session task failed"),
                },
            }

            if self.detached {
                break ExitReason::Detached;
            }
        };

        self.teardown(reason).await;
    }

    /// Polling runs only once time is over, or always when push is gone
    fn poll_enabled(&self) -> bool {
        if self.progress.finished {
            return false;
        }
        self.degraded || self.timer.as_ref().map_or(true, SessionTimer::time_is_over)
    }

    async fn emit(&mut self, event: SessionEvent) {
        if self.events.send(event).await.is_err() {
            debug!("Session events receiver dropped");
            self.detached = true;
        }
    }

    async fn start_question(&mut self, index: usize) {
        self.timer = self
            .quiz
            .question(index)
            .map(|q| SessionTimer::start(index, &q.prompt));

        if let Some(duration) = self.timer.as_ref().map(SessionTimer::duration) {
            debug!(question_index = index, ?duration, "Question started");
            self.emit(SessionEvent::QuestionStarted { index, duration })
                .await;
        }
    }

    fn on_command(&mut self, command: Command) {
        match command {
            Command::Select(answer) => match self.timer.as_mut() {
                Some(timer) => {
                    if timer.select(answer) {
                        trace!(question_index = timer.question_index(), ?answer, "Answer selected");
                    } else {
                        debug!(?answer, "Selection ignored, time is over");
                    }
                }
                None => debug!(?answer, "Selection ignored, no question running"),
            },
            Command::StandingsDismissed => {
                self.standings_showing = false;
            }
        }
    }

    async fn on_time_up(&mut self) {
        let Some(timer) = self.timer.as_mut() else {
            return;
        };
        let Some(selected) = timer.expire() else {
            return;
        };
        let index = timer.question_index();
        let Some(question) = self.quiz.question(index) else {
            return;
        };

        let question_id = question.submission_id(index);
        let record = AnswerRecord::answered(index, selected, question);
        let correct = record.is_correct == Some(true);

        if !self.answers.record(record) {
            return;
        }

        info!(question_index = index, ?selected, correct, "Time is up");
        self.emit(SessionEvent::TimeUp { index, selected }).await;

        // Poll one full interval after time runs out
        self.poll.reset();
        self.spawn_submission(index, question_id, correct);

        if selected.is_some() {
            let delay = self.deps.timing.position_delay;
            self.schedule_position(Some(index), delay).await;
        }
    }

    async fn on_push(&mut self, message: PushMessage) {
        if self.progress.finished {
            trace!(message = message.as_str(), "Ignoring push message after finish");
            return;
        }

        match message {
            PushMessage::NewQuestion if self.standings_showing => {
                self.standings_showing = false;
                self.emit(SessionEvent::ReturnToQuestion).await;
            }
            PushMessage::NewQuestion => {}
            PushMessage::ShowStandings if self.standings_showing => {
                debug!("Standings already showing");
            }
            PushMessage::ShowStandings => {
                self.standings_showing = true;
                self.emit(SessionEvent::ShowStandings).await;

                let delay = self.deps.timing.standings_delay;
                self.schedule_position(None, delay).await;
            }
            PushMessage::Ping => trace!("Ping echoed by server"),
        }

        if message.is_reconciliation_hint() {
            self.spawn_index_read("push");
        }
    }

    async fn on_connection_state(&mut self, state: ConnectionState) {
        self.emit(SessionEvent::Connection(state)).await;

        match state {
            ConnectionState::Open if !self.progress.finished => {
                self.spawn_join("push channel open");
            }
            ConnectionState::Exhausted if !self.degraded => {
                warn!("Push channel unavailable, relying on polling");
                self.degraded = true;
                self.poll.reset();
                self.emit(SessionEvent::PushDegraded).await;
            }
            _ => {}
        }
    }

    async fn on_io(&mut self, outcome: IoOutcome) {
        match outcome {
            IoOutcome::ServerIndex(Ok(server_index)) => self.on_server_index(server_index).await,
            IoOutcome::ServerIndex(Err(e)) => ClientError::ReconciliationReadFailure(e).log(),
            IoOutcome::Position {
                question_index,
                position,
            } => {
                self.position_task = None;
                let stale = self.progress.finished
                    || question_index.is_some_and(|i| i != self.progress.question_index);
                if stale {
                    trace!(?question_index, "Dropping stale position");
                    return;
                }
                self.emit(SessionEvent::Position(position)).await;
            }
            IoOutcome::Completed => {}
        }
    }

    async fn on_server_index(&mut self, server_index: usize) {
        let transition = reconcile(&self.progress, server_index);
        debug!(
            question_index = self.progress.question_index,
            server_index,
            ?transition,
            "Reconciled question index"
        );

        match transition {
            Transition::Noop => {}
            Transition::Advance { from, to } => {
                let synthesized = self.answers.fill_no_answers(transition.skipped());
                self.progress.apply(transition);
                self.cancel_position();

                info!(from, to, synthesized = synthesized.len(), "Advancing to question");
                self.emit(SessionEvent::Advanced { from, to }).await;
                self.start_question(to).await;
                self.spawn_join("question advance");
            }
            Transition::Finish { .. } => self.finish(transition).await,
        }
    }

    async fn finish(&mut self, transition: Transition) {
        // Lock in whatever was selected on a question still counting down
        if let Some(timer) = self.timer.take() {
            let index = timer.question_index();
            if let Some(question) = self.quiz.question(index) {
                if !timer.time_is_over() {
                    self.answers.record(AnswerRecord::answered(
                        index,
                        timer.selected(),
                        question,
                    ));
                }
            }
        }
        self.answers.fill_no_answers(transition.skipped());
        self.progress.apply(transition);
        self.cancel_position();
        self.standings_showing = false;

        info!(
            correct = self.answers.correct_count(),
            total = self.progress.total_questions,
            "Quiz finished"
        );
        self.emit(SessionEvent::Finished).await;

        // Only leaderboard events follow the finish
        self.connection_state = None;
        if let Some(connection) = self.connection.take() {
            connection.close().await;
        }
        self.push_messages = None;

        self.leaderboard = Some(LeaderboardPoller::spawn(
            self.deps.gateway.clone(),
            self.credentials.clone(),
            self.deps.timing.leaderboard_interval,
            self.events.clone(),
        ));
    }

    async fn schedule_position(&mut self, question_index: Option<usize>, delay: Duration) {
        self.cancel_position();

        let gateway = self.deps.gateway.clone();
        let participant_id = self.credentials.participant_id;
        let handle = self.io.spawn(async move {
            tokio::time::sleep(delay).await;
            IoOutcome::Position {
                question_index,
                position: Position::from_lookup(gateway.rank(participant_id).await),
            }
        });
        self.position_task = Some(handle);

        self.emit(SessionEvent::Position(Position::Pending)).await;
    }

    fn cancel_position(&mut self) {
        if let Some(task) = self.position_task.take() {
            task.abort();
        }
    }

    fn spawn_index_read(&mut self, trigger: &'static str) {
        if self.progress.finished {
            return;
        }
        trace!(trigger, "Reading current question index");

        let gateway = self.deps.gateway.clone();
        self.io.spawn(async move {
            IoOutcome::ServerIndex(gateway.current_question_index().await)
        });
    }

    fn spawn_join(&mut self, reason: &'static str) {
        let gateway = self.deps.gateway.clone();
        let credentials = self.credentials.clone();
        self.io.spawn(async move {
            debug!(reason, "Joining session");
            if let Err(e) = gateway
                .join_session(credentials.participant_id, &credentials.session_code)
                .await
            {
                ClientError::from(e).log();
            }
            IoOutcome::Completed
        });
    }

    fn spawn_submission(&mut self, question_index: usize, question_id: QuestionId, correct: bool) {
        let gateway = self.deps.gateway.clone();
        let participant_id = self.credentials.participant_id;
        self.io.spawn(async move {
            if let Err(e) = gateway
                .submit_answer(participant_id, &question_id, correct)
                .await
            {
                ClientError::submission(question_index, e).log();
                return IoOutcome::Completed;
            }
            if correct {
                if let Err(e) = gateway.submit_score(participant_id).await {
                    ClientError::submission(question_index, e).log();
                }
            }
            IoOutcome::Completed
        });
    }

    async fn teardown(mut self, reason: ExitReason) {
        self.cancel_position();
        self.io.shutdown().await;

        if let Some(mut leaderboard) = self.leaderboard.take() {
            leaderboard.stop();
        }
        if let Some(connection) = self.connection.take() {
            connection.close().await;
        }

        if reason == ExitReason::User {
            self.deps.credential_store.clear();
            info!("Quiz session exited");
        } else {
            info!("Quiz session detached");
        }

        let _ = self.events.send(SessionEvent::Ended).await;
    }
}

async fn next_state(
    state: &mut Option<watch::Receiver<ConnectionState>>,
) -> Option<ConnectionState> {
    let Some(receiver) = state else {
        return future::pending().await;
    };
    if receiver.changed().await.is_ok() {
        return Some(*receiver.borrow_and_update());
    }
    // Worker gone; the last state was already delivered
    *state = None;
    None
}

async fn next_push(messages: &mut Option<mpsc::Receiver<PushMessage>>) -> Option<PushMessage> {
    match messages {
        Some(messages) => messages.recv().await,
        None => future::pending().await,
    }
}
