//! Push channel connection management
//!
//! [`ConnectionManager`] owns the single push link of a session. It opens the
//! link on spawn, publishes a [`PushHandle`] while the link is open, keeps it
//! alive with a periodic ping and reconnects with exponential backoff until
//! the budget in [`ReconnectPolicy`] is spent.
//!
//! State machine:
//!
//! ```text
//! Connecting ──► Open ──► Closed ──► Reconnecting ──► Connecting
//!     │                     │
//!     └──── (failure) ──────┴──► Exhausted (terminal)
//! ```

mod messages;
mod policy;
mod transport;

pub use messages::{PushMessage, NEW_QUESTION, PING, SHOW_STANDINGS};
pub use policy::ReconnectPolicy;
pub use transport::{Connector, PushLink, WsConnector};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::error::{ClientError, ClientResult};

/// Buffered push messages awaiting the consumer
const MESSAGE_CAPACITY: usize = 64;

/// Observable state of the push channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
    Reconnecting,
    /// Reconnect budget spent; only an external restart recovers
    Exhausted,
}

impl ConnectionState {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }
}

/// Send side of the live link, published while the link is open
#[derive(Debug, Clone)]
pub struct PushHandle {
    generation: u64,
    outgoing: mpsc::Sender<String>,
}

impl PushHandle {
    /// Increments on every successful open
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Queue a payload on the link without waiting
    pub fn send(&self, payload: &str) -> ClientResult<()> {
        self.outgoing
            .try_send(payload.to_string())
            .map_err(|e| ClientError::ConnectionFailure(format!("send failed: {}", e)))
    }
}

/// Owner of the push channel lifecycle
pub struct ConnectionManager {
    state_rx: watch::Receiver<ConnectionState>,
    handle_rx: watch::Receiver<Option<PushHandle>>,
    message_rx: Option<mpsc::Receiver<PushMessage>>,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ConnectionManager {
    /// Spawn the manager; the first connect attempt starts immediately
    pub fn spawn(
        url: impl Into<String>,
        connector: Arc<dyn Connector>,
        policy: ReconnectPolicy,
        keepalive: Duration,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let (handle_tx, handle_rx) = watch::channel(None);
        let (message_tx, message_rx) = mpsc::channel(MESSAGE_CAPACITY);
        let shutdown = CancellationToken::new();

        let worker = ConnectionWorker {
            url: url.into(),
            connector,
            policy,
            keepalive,
            state_tx,
            handle_tx,
            message_tx,
            shutdown: shutdown.clone(),
            generation: 0,
        };
        let task = tokio::spawn(worker.run());

        Self {
            state_rx,
            handle_rx,
            message_rx: Some(message_rx),
            shutdown,
            task: Some(task),
        }
    }

    /// Current state
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Subscribe to state changes
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// The live handle, or `None` while no link is open
    pub fn handle(&self) -> Option<PushHandle> {
        self.handle_rx.borrow().clone()
    }

    /// Subscribe to handle publication
    pub fn subscribe_handle(&self) -> watch::Receiver<Option<PushHandle>> {
        self.handle_rx.clone()
    }

    /// Take the push message receiver (can only be called once)
    pub fn take_messages(&mut self) -> Option<mpsc::Receiver<PushMessage>> {
        self.message_rx.take()
    }

    /// Cancel pending reconnects and the keep-alive, and close the live link
    ///
    /// Safe to call any number of times.
    pub fn dispose(&mut self) {
        if !self.shutdown.is_cancelled() {
            debug!("Disposing push channel");
        }
        self.shutdown.cancel();
    }

    /// Dispose and wait for the worker to finish its cleanup
    pub async fn close(mut self) {
        self.dispose();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Background task that drives the state machine
struct ConnectionWorker {
    url: String,
    connector: Arc<dyn Connector>,
    policy: ReconnectPolicy,
    keepalive: Duration,
    state_tx: watch::Sender<ConnectionState>,
    handle_tx: watch::Sender<Option<PushHandle>>,
    message_tx: mpsc::Sender<PushMessage>,
    shutdown: CancellationToken,
    generation: u64,
}

/// How a served link ended
enum LinkEnd {
    Remote,
    Disposed,
}

impl ConnectionWorker {
    fn set_state(&self, state: ConnectionState) {
        self.state_tx.send_replace(state);
    }

    async fn run(mut self) {
        loop {
            self.set_state(ConnectionState::Connecting);
            info!(
                attempt = self.policy.attempt() + 1,
                url = %self.url,
                "Opening push channel"
            );

            let result = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                result = self.connector.connect(&self.url) => result,
            };

            match result {
                Ok(link) => {
                    self.policy.reset();
                    if let LinkEnd::Disposed = self.serve(link).await {
                        break;
                    }
                }
                Err(e) => e.log(),
            }

            self.set_state(ConnectionState::Closed);

            let Some(delay) = self.policy.next_delay() else {
                ClientError::ExhaustionFailure {
                    attempts: self.policy.attempt(),
                }
                .log();
                self.set_state(ConnectionState::Exhausted);
                return;
            };

            self.set_state(ConnectionState::Reconnecting);
            info!(
                attempt = self.policy.attempt(),
                max_attempts = self.policy.max_attempts(),
                delay_ms = delay.as_millis() as u64,
                "Scheduling push channel reconnect"
            );

            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.handle_tx.send_replace(None);
        self.set_state(ConnectionState::Closed);
        debug!("Push channel worker stopped");
    }

    /// Publish the link and pump it until either side closes it
    async fn serve(&mut self, mut link: PushLink) -> LinkEnd {
        self.generation += 1;
        self.handle_tx.send_replace(Some(PushHandle {
            generation: self.generation,
            outgoing: link.outgoing.clone(),
        }));
        self.set_state(ConnectionState::Open);
        info!(generation = self.generation, url = %self.url, "Push channel open");

        let mut keepalive = interval_at(Instant::now() + self.keepalive, self.keepalive);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let end = loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break LinkEnd::Disposed,
                _ = keepalive.tick() => {
                    if let Err(e) = link.outgoing.try_send(PING.to_string()) {
                        trace!(error = %e, "Keep-alive dropped");
                    }
                }
                payload = link.incoming.recv() => match payload {
                    Some(text) => self.forward(&text),
                    None => break LinkEnd::Remote,
                },
            }
        };

        // Un-publish before anything else so no consumer sees a dead handle
        self.handle_tx.send_replace(None);
        link.shutdown.cancel();
        if let LinkEnd::Remote = end {
            warn!(generation = self.generation, "Push channel closed");
        }
        end
    }

    fn forward(&self, payload: &str) {
        let Some(message) = PushMessage::parse(payload) else {
            trace!(payload, "Ignoring unrecognised push payload");
            return;
        };

        if let Err(e) = self.message_tx.try_send(message) {
            debug!(error = %e, "Push message dropped");
        }
    }
}
