//! The Server Gateway contract consumed by the quiz client

use async_trait::async_trait;

use crate::error::GatewayResult;
use crate::models::{LeaderboardEntry, QuestionId, Quiz};

/// Request/response operations exposed by the quiz server
///
/// Implementations must be cheap to share; the session driver holds one
/// behind an `Arc` and calls it from spawned tasks.
#[async_trait]
pub trait ServerGateway: Send + Sync {
    /// Register the participant in the session. Idempotent.
    async fn join_session(&self, participant_id: u64, session_code: &str) -> GatewayResult<()>;

    /// Authoritative index of the question the session is on
    async fn current_question_index(&self) -> GatewayResult<usize>;

    /// Full ranked participant list
    async fn leaderboard(&self) -> GatewayResult<Vec<LeaderboardEntry>>;

    /// Rank of one participant; `None` when the server returned its sentinel
    async fn rank(&self, participant_id: u64) -> GatewayResult<Option<u32>>;

    /// Record whether the participant answered a question correctly
    async fn submit_answer(
        &self,
        participant_id: u64,
        question_id: &QuestionId,
        correct: bool,
    ) -> GatewayResult<()>;

    /// Credit one point; only called for correct answers
    async fn submit_score(&self, participant_id: u64) -> GatewayResult<()>;

    /// Questions of the session
    async fn fetch_quiz(&self, session_code: &str) -> GatewayResult<Quiz>;
}
