//! Scripted push transport
//!
//! [`MockConnector`] hands the test the server end of every link it opens,
//! so tests can push payloads, read what the client sent and drop links.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use quizsync_client::{ClientError, ClientResult, Connector, PushLink};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Outcome of one connect attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Accept,
    Refuse,
}

/// Server end of an accepted link
pub struct ServerLink {
    /// Payloads the client sent
    pub from_client: mpsc::Receiver<String>,
    /// Push payloads to the client; dropping it closes the link
    pub to_client: mpsc::Sender<String>,
    /// Cancelled when the client closes the link
    pub shutdown: CancellationToken,
}

impl ServerLink {
    pub async fn push(&self, payload: &str) {
        self.to_client
            .send(payload.to_string())
            .await
            .expect("client side of the link is gone");
    }

    /// Close the link from the server side
    pub fn close(self) {
        drop(self.to_client);
    }
}

/// Connector that follows a script of accept/refuse outcomes
pub struct MockConnector {
    plan: Mutex<VecDeque<Attempt>>,
    fallback: Attempt,
    attempts: Mutex<Vec<Instant>>,
    urls: Mutex<Vec<String>>,
    links: mpsc::UnboundedSender<ServerLink>,
}

impl MockConnector {
    /// Follow `plan`, then answer every further attempt with `fallback`
    pub fn scripted(
        plan: Vec<Attempt>,
        fallback: Attempt,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<ServerLink>) {
        let (links, link_rx) = mpsc::unbounded_channel();
        let connector = Arc::new(Self {
            plan: Mutex::new(plan.into()),
            fallback,
            attempts: Mutex::new(Vec::new()),
            urls: Mutex::new(Vec::new()),
            links,
        });
        (connector, link_rx)
    }

    /// Accept every attempt
    pub fn accepting() -> (Arc<Self>, mpsc::UnboundedReceiver<ServerLink>) {
        Self::scripted(Vec::new(), Attempt::Accept)
    }

    /// Refuse every attempt
    pub fn refusing() -> Arc<Self> {
        Self::scripted(Vec::new(), Attempt::Refuse).0
    }

    /// Number of connect attempts so far
    pub fn attempts(&self) -> usize {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// When each connect attempt happened
    pub fn attempt_times(&self) -> Vec<Instant> {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// URLs passed to `connect`
    pub fn urls(&self) -> Vec<String> {
        self.urls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, url: &str) -> ClientResult<PushLink> {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Instant::now());
        self.urls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());

        let attempt = self
            .plan
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(self.fallback);

        if attempt == Attempt::Refuse {
            return Err(ClientError::ConnectionFailure(
                "connection refused".to_string(),
            ));
        }

        let (out_tx, out_rx) = mpsc::channel(32);
        let (in_tx, in_rx) = mpsc::channel(64);
        let shutdown = CancellationToken::new();

        // The test may not care about the server end
        let _ = self.links.send(ServerLink {
            from_client: out_rx,
            to_client: in_tx,
            shutdown: shutdown.clone(),
        });

        Ok(PushLink {
            outgoing: out_tx,
            incoming: in_rx,
            shutdown,
        })
    }
}
