//! Mock quiz server for HTTP gateway tests
//!
//! Provides a [`MockQuizServer`] that serves the quiz server endpoints so the
//! HTTP gateway client can be exercised end to end.

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Build a quiz payload in the server's wire format
///
/// Each tuple is `(prompt, correct_answer)`; ids are `q0`, `q1`, ...
pub fn quiz_fixture(questions: &[(&str, bool)]) -> Value {
    let questions: Vec<Value> = questions
        .iter()
        .enumerate()
        .map(|(i, (prompt, correct))| {
            json!({
                "_id": format!("q{}", i),
                "enunciado": prompt,
                "resposta": if *correct { "v" } else { "f" },
            })
        })
        .collect();

    json!({ "questoes": questions })
}

/// Mock quiz server
///
/// Wraps a [`wiremock::MockServer`] with helpers for the quiz endpoints.
///
/// # Example
///
/// ```rust,ignore
/// use quizsync_test_utils::MockQuizServer;
///
/// #[tokio::test]
/// async fn test_index() {
///     let server = MockQuizServer::start().await;
///     server.mock_current_index(2).await;
///     // Point an ApiConfig at server.url()
/// }
/// ```
pub struct MockQuizServer {
    server: MockServer,
}

impl MockQuizServer {
    /// Start a new mock quiz server
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Get the server URL
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Accept every join request
    pub async fn mock_join(&self) {
        Mock::given(method("POST"))
            .and(path("/conectarAluno"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .mount(&self.server)
            .await;
    }

    /// Serve a fixed authoritative question index
    pub async fn mock_current_index(&self, index: usize) {
        Mock::given(method("GET"))
            .and(path("/retornaQuestaoAtual"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(index)))
            .mount(&self.server)
            .await;
    }

    /// Serve a leaderboard of `(participant_id, name, score)` rows
    pub async fn mock_leaderboard(&self, rows: &[(u64, &str, u32)]) {
        let body: Vec<Value> = rows
            .iter()
            .map(|(id, name, score)| json!({ "matricula": id, "nome": name, "pontuacao": score }))
            .collect();

        Mock::given(method("GET"))
            .and(path("/retornaPodio"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Serve a rank for every participant
    pub async fn mock_rank(&self, rank: Value) {
        Mock::given(method("POST"))
            .and(path("/retornaPosicao"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "posicao": rank })))
            .mount(&self.server)
            .await;
    }

    /// Accept answer and score submissions
    pub async fn mock_submissions(&self) {
        for p in ["/salvaRespostaUnica", "/salvaPontuacao"] {
            Mock::given(method("POST"))
                .and(path(p))
                .respond_with(ResponseTemplate::new(200))
                .mount(&self.server)
                .await;
        }
    }

    /// Serve a quiz for a session code
    pub async fn mock_quiz(&self, session_code: &str, questions: &[(&str, bool)]) {
        Mock::given(method("GET"))
            .and(path(format!("/questionario/{}", session_code)))
            .respond_with(ResponseTemplate::new(200).set_body_json(quiz_fixture(questions)))
            .mount(&self.server)
            .await;
    }

    /// Fail every request to `endpoint` with the given status
    pub async fn mock_failure(&self, http_method: &str, endpoint: &str, status_code: u16) {
        Mock::given(method(http_method))
            .and(path(endpoint))
            .respond_with(
                ResponseTemplate::new(status_code).set_body_json(json!({ "error": "mock failure" })),
            )
            .mount(&self.server)
            .await;
    }

    /// Number of requests received for a path
    pub async fn request_count(&self, endpoint: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == endpoint)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiz_fixture_shape() {
        let quiz = quiz_fixture(&[("first", true), ("second", false)]);
        assert_eq!(quiz["questoes"][0]["_id"], "q0");
        assert_eq!(quiz["questoes"][0]["resposta"], "v");
        assert_eq!(quiz["questoes"][1]["resposta"], "f");
    }

    #[tokio::test]
    async fn test_mock_current_index() {
        let server = MockQuizServer::start().await;
        server.mock_current_index(3).await;

        let body: usize = reqwest::get(format!("{}/retornaQuestaoAtual", server.url()))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body, 3);
        assert_eq!(server.request_count("/retornaQuestaoAtual").await, 1);
    }
}
