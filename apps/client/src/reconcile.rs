//! Reconciliation of local progress against the server's authoritative index
//!
//! [`reconcile`] is a pure reducer: the outcome depends only on the local
//! [`Progress`] and the index the server reported, never on which channel
//! triggered the read. Applying its result is monotonic and finishing is
//! one-shot, so duplicate or out-of-order triggers converge.

use std::collections::BTreeMap;
use std::ops::Range;

use chrono::{DateTime, Utc};
use quizsync_gateway_client::Question;
use serde::Serialize;

/// Local session progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub question_index: usize,
    pub total_questions: usize,
    pub finished: bool,
}

/// Outcome of one reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Move to question `to`; `from..to` were skipped
    Advance { from: usize, to: usize },
    /// The quiz is over; `from..to` were never answered through the timer
    Finish { from: usize, to: usize },
    Noop,
}

impl Transition {
    /// Indices the client passed without a timer-driven answer
    pub fn skipped(&self) -> Range<usize> {
        match *self {
            Self::Advance { from, to } | Self::Finish { from, to } => from..to,
            Self::Noop => 0..0,
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, Self::Noop)
    }
}

impl Progress {
    pub fn new(total_questions: usize) -> Self {
        Self {
            question_index: 0,
            total_questions,
            finished: false,
        }
    }

    /// Apply a transition produced by [`reconcile`]
    ///
    /// The index never moves backward and `finished` never resets.
    pub fn apply(&mut self, transition: Transition) {
        match transition {
            Transition::Advance { to, .. } => {
                self.question_index = self.question_index.max(to);
            }
            Transition::Finish { .. } => {
                self.finished = true;
            }
            Transition::Noop => {}
        }
    }
}

/// Resolve local progress against the server's current index
pub fn reconcile(progress: &Progress, server_index: usize) -> Transition {
    if progress.finished {
        return Transition::Noop;
    }

    if server_index >= progress.total_questions {
        return Transition::Finish {
            from: progress.question_index,
            to: progress.total_questions,
        };
    }

    if server_index <= progress.question_index {
        return Transition::Noop;
    }

    Transition::Advance {
        from: progress.question_index,
        to: server_index,
    }
}

/// The final answer for one question
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerRecord {
    pub question_index: usize,
    /// `None` means no answer before time ran out
    pub selected: Option<bool>,
    /// `None` when there was no answer to judge
    pub is_correct: Option<bool>,
    pub submitted_at: DateTime<Utc>,
}

impl AnswerRecord {
    pub fn answered(question_index: usize, selected: Option<bool>, question: &Question) -> Self {
        Self {
            question_index,
            selected,
            is_correct: selected.map(|_| question.is_correct(selected)),
            submitted_at: Utc::now(),
        }
    }

    pub fn no_answer(question_index: usize) -> Self {
        Self {
            question_index,
            selected: None,
            is_correct: None,
            submitted_at: Utc::now(),
        }
    }
}

/// Write-once answer records keyed by question index
#[derive(Debug, Default)]
pub struct AnswerBook {
    records: BTreeMap<usize, AnswerRecord>,
}

impl AnswerBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record; returns `false` when the index already has one
    pub fn record(&mut self, record: AnswerRecord) -> bool {
        if self.records.contains_key(&record.question_index) {
            tracing::trace!(
                question_index = record.question_index,
                "Answer already recorded"
            );
            return false;
        }
        self.records.insert(record.question_index, record);
        true
    }

    /// Record "no answer" for every index in `range` that has no record yet
    ///
    /// Returns the indices that were filled.
    pub fn fill_no_answers(&mut self, range: Range<usize>) -> Vec<usize> {
        range
            .filter(|&index| self.record(AnswerRecord::no_answer(index)))
            .collect()
    }

    pub fn get(&self, question_index: usize) -> Option<&AnswerRecord> {
        self.records.get(&question_index)
    }

    pub fn contains(&self, question_index: usize) -> bool {
        self.records.contains_key(&question_index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in question order
    pub fn records(&self) -> impl Iterator<Item = &AnswerRecord> {
        self.records.values()
    }

    pub fn correct_count(&self) -> usize {
        self.records
            .values()
            .filter(|r| r.is_correct == Some(true))
            .count()
    }
}
