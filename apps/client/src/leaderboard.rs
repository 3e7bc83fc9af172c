//! Final leaderboard polling
//!
//! Runs only after the quiz finished: one join, one fetch that resolves the
//! participant's own score, then a fixed-interval fetch that republishes the
//! whole ranking every tick.

use std::sync::Arc;
use std::time::Duration;

use quizsync_gateway_client::{LeaderboardEntry, ServerGateway};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::credentials::SessionCredentials;
use crate::error::ClientError;
use crate::session::SessionEvent;

/// Entries shown on the final results view
pub const TOP_ENTRIES: usize = 10;

/// One full leaderboard fetch, in server order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaderboardSnapshot {
    entries: Vec<LeaderboardEntry>,
}

impl LeaderboardSnapshot {
    pub fn new(entries: Vec<LeaderboardEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    /// The first `n` entries
    pub fn top(&self, n: usize) -> &[LeaderboardEntry] {
        &self.entries[..n.min(self.entries.len())]
    }

    /// 1-based position of a participant
    pub fn position_of(&self, participant_id: u64) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.participant_id == participant_id)
            .map(|i| i + 1)
    }

    pub fn score_of(&self, participant_id: u64) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.participant_id == participant_id)
            .map(|e| e.score)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Background leaderboard poll; stopped explicitly or on drop
pub struct LeaderboardPoller {
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl LeaderboardPoller {
    pub fn spawn(
        gateway: Arc<dyn ServerGateway>,
        credentials: SessionCredentials,
        interval: Duration,
        events: mpsc::Sender<SessionEvent>,
    ) -> Self {
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();

        let task = tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = poll(gateway, credentials, interval, events) => {}
            }
            debug!("Leaderboard poller stopped");
        });

        Self {
            shutdown,
            task: Some(task),
        }
    }

    /// Cancel the repeating poll and any fetch in flight; idempotent
    pub fn stop(&mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for LeaderboardPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll(
    gateway: Arc<dyn ServerGateway>,
    credentials: SessionCredentials,
    interval: Duration,
    events: mpsc::Sender<SessionEvent>,
) {
    let participant_id = credentials.participant_id;

    if let Err(e) = gateway
        .join_session(participant_id, &credentials.session_code)
        .await
    {
        ClientError::from(e).log();
    }

    match gateway.leaderboard().await {
        Ok(entries) => {
            let snapshot = LeaderboardSnapshot::new(entries);
            if let Some(score) = snapshot.score_of(participant_id) {
                info!(participant_id, score, "Resolved own score");
                if events.send(SessionEvent::OwnScore(score)).await.is_err() {
                    return;
                }
            }
        }
        Err(e) => ClientError::from(e).log(),
    }

    let mut ticker = interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match gateway.leaderboard().await {
            Ok(entries) => {
                let snapshot = LeaderboardSnapshot::new(entries);
                debug!(entries = snapshot.len(), "Leaderboard refreshed");
                if events
                    .send(SessionEvent::Leaderboard(snapshot))
                    .await
                    .is_err()
                {
                    return;
                }
            }
            Err(e) => warn!(error = %e, "Leaderboard refresh failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(participant_id: u64, score: u32) -> LeaderboardEntry {
        LeaderboardEntry {
            participant_id,
            name: format!("participant {}", participant_id),
            score,
        }
    }

    #[test]
    fn test_snapshot_queries() {
        let snapshot =
            LeaderboardSnapshot::new((1..=12).rev().map(|id| entry(id, id as u32)).collect());

        assert_eq!(snapshot.top(TOP_ENTRIES).len(), 10);
        assert_eq!(snapshot.top(TOP_ENTRIES)[0].participant_id, 12);
        assert_eq!(snapshot.position_of(12), Some(1));
        assert_eq!(snapshot.position_of(1), Some(12));
        assert_eq!(snapshot.position_of(99), None);
        assert_eq!(snapshot.score_of(5), Some(5));
    }

    #[test]
    fn test_top_of_short_list() {
        let snapshot = LeaderboardSnapshot::new(vec![entry(1, 3)]);
        assert_eq!(snapshot.top(TOP_ENTRIES).len(), 1);
        assert!(LeaderboardSnapshot::default().top(TOP_ENTRIES).is_empty());
    }
}
