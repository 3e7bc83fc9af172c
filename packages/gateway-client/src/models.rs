//! Quiz server models
//!
//! Public types use domain names; the `Raw*` and request types mirror the
//! server's JSON field names.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier the server assigned to a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionId {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for QuestionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A true/false question
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    /// Server identifier, when the server sent one
    pub id: Option<QuestionId>,
    /// Question text
    pub prompt: String,
    /// Whether "true" is the correct answer
    pub correct_answer: bool,
}

impl Question {
    /// Create a question without a server identifier
    pub fn new(prompt: impl Into<String>, correct_answer: bool) -> Self {
        Self {
            id: None,
            prompt: prompt.into(),
            correct_answer,
        }
    }

    /// Identifier used when submitting an answer; falls back to the index
    pub fn submission_id(&self, index: usize) -> QuestionId {
        self.id
            .clone()
            .unwrap_or(QuestionId::Number(index as i64))
    }

    /// Whether `selected` is the correct answer; no answer is never correct
    pub fn is_correct(&self, selected: Option<bool>) -> bool {
        selected == Some(self.correct_answer)
    }
}

/// A quiz: an ordered, immutable list of questions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quiz {
    pub questions: Vec<Question>,
}

impl Quiz {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// Number of questions
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the quiz has no questions
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }
}

/// One participant on the ranked leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    #[serde(rename = "matricula")]
    pub participant_id: u64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "pontuacao", default)]
    pub score: u32,
}

// Internal wire types

#[derive(Debug, Deserialize)]
pub(crate) struct RawQuiz {
    #[serde(rename = "questoes", default)]
    pub questions: Vec<RawQuestion>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawQuestion {
    #[serde(rename = "_id", default)]
    pub id: Option<QuestionId>,
    #[serde(rename = "enunciado")]
    pub prompt: String,
    #[serde(rename = "resposta", default)]
    pub answer: Value,
}

impl From<RawQuestion> for Question {
    fn from(raw: RawQuestion) -> Self {
        // The server marks the correct answer with "v" (true) or "f" (false)
        let correct_answer = match &raw.answer {
            Value::String(s) => s.trim().eq_ignore_ascii_case("v"),
            other => {
                tracing::warn!(answer = %other, "Unexpected answer key, treating as false");
                false
            }
        };

        Self {
            id: raw.id,
            prompt: raw.prompt,
            correct_answer,
        }
    }
}

impl From<RawQuiz> for Quiz {
    fn from(raw: RawQuiz) -> Self {
        Self {
            questions: raw.questions.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PositionResponse {
    #[serde(rename = "posicao", default)]
    pub position: Value,
}

impl PositionResponse {
    /// Rank as a positive integer; anything else is the server's sentinel
    pub fn rank(&self) -> Option<u32> {
        match &self.position {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
        .filter(|rank| *rank > 0)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JoinRequest<'a> {
    #[serde(rename = "matricula")]
    pub participant_id: u64,
    #[serde(rename = "codigo")]
    pub session_code: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct PositionRequest {
    #[serde(rename = "matricula")]
    pub participant_id: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnswerSubmission<'a> {
    #[serde(rename = "matricula")]
    pub participant_id: u64,
    #[serde(rename = "idQuestao")]
    pub question_id: &'a QuestionId,
    #[serde(rename = "acertou")]
    pub correct: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScoreSubmission {
    #[serde(rename = "matricula")]
    pub participant_id: u64,
    #[serde(rename = "acertou")]
    pub correct: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_question_parsing() {
        let raw: RawQuiz = serde_json::from_value(json!({
            "questoes": [
                { "_id": "abc", "enunciado": "Rust is memory safe", "resposta": "V" },
                { "enunciado": "Water boils at 50C", "resposta": "f" },
                { "_id": 7, "enunciado": "Odd key", "resposta": true }
            ]
        }))
        .unwrap();

        let quiz: Quiz = raw.into();
        assert_eq!(quiz.len(), 3);
        assert!(quiz.questions[0].correct_answer);
        assert_eq!(quiz.questions[0].id, Some(QuestionId::Text("abc".to_string())));
        assert!(!quiz.questions[1].correct_answer);
        assert_eq!(quiz.questions[1].id, None);
        assert!(!quiz.questions[2].correct_answer);
        assert_eq!(quiz.questions[2].id, Some(QuestionId::Number(7)));
    }

    #[test]
    fn test_submission_id_falls_back_to_index() {
        let question = Question::new("prompt", true);
        assert_eq!(question.submission_id(3), QuestionId::Number(3));
    }

    #[test]
    fn test_is_correct() {
        let question = Question::new("prompt", false);
        assert!(question.is_correct(Some(false)));
        assert!(!question.is_correct(Some(true)));
        assert!(!question.is_correct(None));
    }

    #[test]
    fn test_position_response_rank() {
        let parse = |v: Value| PositionResponse { position: v }.rank();
        assert_eq!(parse(json!(3)), Some(3));
        assert_eq!(parse(json!("12")), Some(12));
        assert_eq!(parse(json!(0)), None);
        assert_eq!(parse(json!(-1)), None);
        assert_eq!(parse(json!(null)), None);
        assert_eq!(parse(json!("--")), None);
    }

    #[test]
    fn test_leaderboard_entry_wire_names() {
        let entry: LeaderboardEntry = serde_json::from_value(json!({
            "matricula": 42,
            "nome": "Ada",
            "pontuacao": 5
        }))
        .unwrap();
        assert_eq!(entry.participant_id, 42);
        assert_eq!(entry.name, "Ada");
        assert_eq!(entry.score, 5);
    }

    #[test]
    fn test_answer_submission_wire_names() {
        let id = QuestionId::Text("q1".to_string());
        let body = serde_json::to_value(AnswerSubmission {
            participant_id: 9,
            question_id: &id,
            correct: false,
        })
        .unwrap();
        assert_eq!(body, json!({ "matricula": 9, "idQuestao": "q1", "acertou": false }));
    }
}
