//! In-memory Server Gateway for driving quiz client tests
//!
//! Uses `unwrap_or_else(|e| e.into_inner())` on lock acquisition so a test
//! that panics while holding the lock doesn't cascade into other tests.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use quizsync_gateway_client::{
    GatewayError, GatewayResult, LeaderboardEntry, QuestionId, Quiz, ServerGateway,
};

/// A recorded gateway call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Join {
        participant_id: u64,
        session_code: String,
    },
    CurrentIndex,
    Leaderboard,
    Rank(u64),
    SubmitAnswer {
        participant_id: u64,
        question_id: QuestionId,
        correct: bool,
    },
    SubmitScore(u64),
    FetchQuiz(String),
}

#[derive(Default)]
struct ScriptState {
    current_index: usize,
    fail_index_reads: bool,
    leaderboard: Vec<LeaderboardEntry>,
    fail_leaderboard: bool,
    rank: Option<u32>,
    fail_rank: bool,
    fail_submissions: bool,
    quiz: Option<Quiz>,
    calls: Vec<GatewayCall>,
}

/// Scriptable in-memory quiz server
///
/// Clones share the same script and call log.
#[derive(Clone, Default)]
pub struct ScriptedGateway {
    state: Arc<RwLock<ScriptState>>,
}

impl ScriptedGateway {
    /// Create a gateway at question 0 with an empty leaderboard
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a gateway that serves `quiz` from `fetch_quiz`
    pub fn with_quiz(quiz: Quiz) -> Self {
        let gateway = Self::new();
        gateway.write(|s| s.quiz = Some(quiz));
        gateway
    }

    fn write<R>(&self, f: impl FnOnce(&mut ScriptState) -> R) -> R {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }

    fn read<R>(&self, f: impl FnOnce(&ScriptState) -> R) -> R {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        f(&state)
    }

    fn record(&self, call: GatewayCall) {
        self.write(|s| s.calls.push(call));
    }

    /// Move the authoritative question index
    pub fn set_current_index(&self, index: usize) {
        self.write(|s| s.current_index = index);
    }

    /// Make current-index reads fail until reset
    pub fn fail_index_reads(&self, fail: bool) {
        self.write(|s| s.fail_index_reads = fail);
    }

    /// Replace the leaderboard snapshot
    pub fn set_leaderboard(&self, entries: Vec<LeaderboardEntry>) {
        self.write(|s| s.leaderboard = entries);
    }

    /// Make leaderboard reads fail until reset
    pub fn fail_leaderboard(&self, fail: bool) {
        self.write(|s| s.fail_leaderboard = fail);
    }

    /// Set the rank returned for every participant
    pub fn set_rank(&self, rank: Option<u32>) {
        self.write(|s| s.rank = rank);
    }

    /// Make rank lookups fail until reset
    pub fn fail_rank(&self, fail: bool) {
        self.write(|s| s.fail_rank = fail);
    }

    /// Make answer and score submissions fail until reset
    pub fn fail_submissions(&self, fail: bool) {
        self.write(|s| s.fail_submissions = fail);
    }

    /// All calls received so far, in order
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.read(|s| s.calls.clone())
    }

    /// Number of recorded calls matching `pred`
    pub fn count(&self, pred: impl Fn(&GatewayCall) -> bool) -> usize {
        self.read(|s| s.calls.iter().filter(|c| pred(c)).count())
    }

    /// Number of current-index reads
    pub fn index_reads(&self) -> usize {
        self.count(|c| matches!(c, GatewayCall::CurrentIndex))
    }

    /// Number of join-session calls
    pub fn joins(&self) -> usize {
        self.count(|c| matches!(c, GatewayCall::Join { .. }))
    }

    /// Number of leaderboard reads
    pub fn leaderboard_reads(&self) -> usize {
        self.count(|c| matches!(c, GatewayCall::Leaderboard))
    }

    /// Answer submissions as `(question_id, correct)` pairs
    pub fn answer_submissions(&self) -> Vec<(QuestionId, bool)> {
        self.read(|s| {
            s.calls
                .iter()
                .filter_map(|c| match c {
                    GatewayCall::SubmitAnswer {
                        question_id,
                        correct,
                        ..
                    } => Some((question_id.clone(), *correct)),
                    _ => None,
                })
                .collect()
        })
    }

    /// Number of score submissions
    pub fn score_submissions(&self) -> usize {
        self.count(|c| matches!(c, GatewayCall::SubmitScore(_)))
    }

    fn unavailable(what: &str) -> GatewayError {
        GatewayError::Unavailable(format!("scripted {} failure", what))
    }
}

#[async_trait]
impl ServerGateway for ScriptedGateway {
    async fn join_session(&self, participant_id: u64, session_code: &str) -> GatewayResult<()> {
        self.record(GatewayCall::Join {
            participant_id,
            session_code: session_code.to_string(),
        });
        Ok(())
    }

    async fn current_question_index(&self) -> GatewayResult<usize> {
        self.record(GatewayCall::CurrentIndex);
        self.read(|s| {
            if s.fail_index_reads {
                Err(Self::unavailable("index read"))
            } else {
                Ok(s.current_index)
            }
        })
    }

    async fn leaderboard(&self) -> GatewayResult<Vec<LeaderboardEntry>> {
        self.record(GatewayCall::Leaderboard);
        self.read(|s| {
            if s.fail_leaderboard {
                Err(Self::unavailable("leaderboard"))
            } else {
                Ok(s.leaderboard.clone())
            }
        })
    }

    async fn rank(&self, participant_id: u64) -> GatewayResult<Option<u32>> {
        self.record(GatewayCall::Rank(participant_id));
        self.read(|s| {
            if s.fail_rank {
                Err(Self::unavailable("rank"))
            } else {
                Ok(s.rank)
            }
        })
    }

    async fn submit_answer(
        &self,
        participant_id: u64,
        question_id: &QuestionId,
        correct: bool,
    ) -> GatewayResult<()> {
        self.record(GatewayCall::SubmitAnswer {
            participant_id,
            question_id: question_id.clone(),
            correct,
        });
        if self.read(|s| s.fail_submissions) {
            return Err(Self::unavailable("answer submission"));
        }
        Ok(())
    }

    async fn submit_score(&self, participant_id: u64) -> GatewayResult<()> {
        self.record(GatewayCall::SubmitScore(participant_id));
        if self.read(|s| s.fail_submissions) {
            return Err(Self::unavailable("score submission"));
        }
        Ok(())
    }

    async fn fetch_quiz(&self, session_code: &str) -> GatewayResult<Quiz> {
        self.record(GatewayCall::FetchQuiz(session_code.to_string()));
        self.read(|s| s.quiz.clone())
            .ok_or_else(|| GatewayError::Status {
                status: 404,
                body: format!("no quiz for {}", session_code),
            })
    }
}
