//! HTTP implementation of the Server Gateway

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use quizsync_shared_config::ApiConfig;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::ServerGateway;
use crate::models::{
    AnswerSubmission, JoinRequest, LeaderboardEntry, PositionRequest, PositionResponse,
    QuestionId, Quiz, RawQuiz, ScoreSubmission,
};

/// Default connection timeout in seconds
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Maximum error body size kept in [`GatewayError::Status`]
const MAX_ERROR_BODY_SIZE: usize = 500;

/// Maximum session code length accepted before a request is made
const MAX_SESSION_CODE_LENGTH: usize = 64;

const JOIN_PATH: &str = "/conectarAluno";
const CURRENT_QUESTION_PATH: &str = "/retornaQuestaoAtual";
const LEADERBOARD_PATH: &str = "/retornaPodio";
const POSITION_PATH: &str = "/retornaPosicao";
const ANSWER_PATH: &str = "/salvaRespostaUnica";
const SCORE_PATH: &str = "/salvaPontuacao";
const QUIZ_PATH: &str = "/questionario";

/// Quiz server HTTP client
#[derive(Clone)]
pub struct GatewayClient {
    http_client: Client,
    config: ApiConfig,
}

impl fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayClient")
            .field("url", &self.config.url)
            .field("timeout_secs", &self.config.timeout_secs)
            .finish()
    }
}

impl GatewayClient {
    /// Create a new client from configuration
    ///
    /// Every request is bounded by `config.timeout_secs`.
    pub fn new(config: &ApiConfig) -> GatewayResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent("quizsync/0.1")
            .build()?;

        Ok(Self {
            http_client,
            config: config.clone(),
        })
    }

    /// Create a client with a custom HTTP client (for testing)
    pub fn with_client(config: &ApiConfig, http_client: Client) -> Self {
        Self {
            http_client,
            config: config.clone(),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn validate_session_code(session_code: &str) -> GatewayResult<&str> {
        let trimmed = session_code.trim();
        if trimmed.is_empty() {
            return Err(GatewayError::InvalidInput(
                "session code cannot be empty".to_string(),
            ));
        }
        if trimmed.len() > MAX_SESSION_CODE_LENGTH {
            return Err(GatewayError::InvalidInput(format!(
                "session code too long (max {} characters)",
                MAX_SESSION_CODE_LENGTH
            )));
        }
        Ok(trimmed)
    }

    /// Truncate error body, respecting UTF-8 boundaries
    fn truncate_error_body(body: String) -> String {
        if body.len() <= MAX_ERROR_BODY_SIZE {
            return body;
        }

        let truncate_at = body
            .char_indices()
            .map(|(i, _)| i)
            .take_while(|i| *i <= MAX_ERROR_BODY_SIZE)
            .last()
            .unwrap_or(0);

        format!("{}... (truncated)", &body[..truncate_at])
    }

    /// Send a request and return the body of a successful response
    async fn execute(&self, request: RequestBuilder) -> GatewayResult<String> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout
            } else {
                GatewayError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = Self::truncate_error_body(response.text().await.unwrap_or_default());
            warn!(status = status.as_u16(), body = %body, "Quiz server request failed");
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout
            } else {
                GatewayError::Http(e)
            }
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> GatewayResult<T> {
        let text = self
            .execute(self.http_client.get(self.config.endpoint(path)))
            .await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn post<B: serde::Serialize + ?Sized>(&self, path: &str, body: &B) -> GatewayResult<String> {
        self.execute(self.http_client.post(self.config.endpoint(path)).json(body))
            .await
    }
}

#[async_trait]
impl ServerGateway for GatewayClient {
    #[instrument(skip(self))]
    async fn join_session(&self, participant_id: u64, session_code: &str) -> GatewayResult<()> {
        let session_code = Self::validate_session_code(session_code)?;
        self.post(
            JOIN_PATH,
            &JoinRequest {
                participant_id,
                session_code,
            },
        )
        .await?;
        debug!(participant_id, "Joined quiz session");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn current_question_index(&self) -> GatewayResult<usize> {
        let index: usize = self.get_json(CURRENT_QUESTION_PATH).await?;
        debug!(server_index = index, "Fetched current question index");
        Ok(index)
    }

    #[instrument(skip(self))]
    async fn leaderboard(&self) -> GatewayResult<Vec<LeaderboardEntry>> {
        let entries: Vec<LeaderboardEntry> = self.get_json(LEADERBOARD_PATH).await?;
        debug!(entry_count = entries.len(), "Fetched leaderboard");
        Ok(entries)
    }

    #[instrument(skip(self))]
    async fn rank(&self, participant_id: u64) -> GatewayResult<Option<u32>> {
        let text = self
            .post(POSITION_PATH, &PositionRequest { participant_id })
            .await?;
        let response: PositionResponse = serde_json::from_str(&text)?;
        Ok(response.rank())
    }

    #[instrument(skip(self))]
    async fn submit_answer(
        &self,
        participant_id: u64,
        question_id: &QuestionId,
        correct: bool,
    ) -> GatewayResult<()> {
        self.post(
            ANSWER_PATH,
            &AnswerSubmission {
                participant_id,
                question_id,
                correct,
            },
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn submit_score(&self, participant_id: u64) -> GatewayResult<()> {
        self.post(
            SCORE_PATH,
            &ScoreSubmission {
                participant_id,
                correct: true,
            },
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn fetch_quiz(&self, session_code: &str) -> GatewayResult<Quiz> {
        let session_code = Self::validate_session_code(session_code)?;
        let raw: RawQuiz = self
            .get_json(&format!("{}/{}", QUIZ_PATH, session_code))
            .await?;
        let quiz: Quiz = raw.into();
        debug!(question_count = quiz.len(), "Fetched quiz");
        Ok(quiz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> GatewayClient {
        GatewayClient::new(&ApiConfig::with_url(server.uri())).unwrap()
    }

    #[test]
    fn test_debug_shows_url() {
        let client = GatewayClient::new(&ApiConfig::with_url("http://quiz.local")).unwrap();
        let debug_str = format!("{:?}", client);
        assert!(debug_str.contains("http://quiz.local"));
    }

    #[test]
    fn test_validate_session_code() {
        assert_matches!(
            GatewayClient::validate_session_code("   "),
            Err(GatewayError::InvalidInput(_))
        );
        assert_matches!(
            GatewayClient::validate_session_code(&"x".repeat(MAX_SESSION_CODE_LENGTH + 1)),
            Err(GatewayError::InvalidInput(_))
        );
        assert_matches!(GatewayClient::validate_session_code(" ABC123 "), Ok("ABC123"));
    }

    #[test]
    fn test_truncate_error_body_multibyte() {
        let body = "é".repeat(MAX_ERROR_BODY_SIZE);
        let truncated = GatewayClient::truncate_error_body(body);
        assert!(truncated.ends_with("... (truncated)"));
    }

    #[tokio::test]
    async fn test_current_question_index() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CURRENT_QUESTION_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(4)))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(client.current_question_index().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_join_session_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(JOIN_PATH))
            .and(body_json(json!({ "matricula": 1234, "codigo": "QUIZ42" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client.join_session(1234, "QUIZ42").await.unwrap();
    }

    #[tokio::test]
    async fn test_rank_sentinel() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(POSITION_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "posicao": null })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(client.rank(1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_server_error_maps_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LEADERBOARD_PATH))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.leaderboard().await.unwrap_err();
        assert_matches!(err, GatewayError::Status { status: 503, .. });
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_submit_score_sends_correct_flag() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SCORE_PATH))
            .and(body_json(json!({ "matricula": 5, "acertou": true })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client.submit_score(5).await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_quiz() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/questionario/ABC"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "questoes": [{ "_id": "q1", "enunciado": "Is this a test?", "resposta": "v" }]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let quiz = client.fetch_quiz("ABC").await.unwrap();
        assert_eq!(quiz.len(), 1);
        assert!(quiz.questions[0].correct_answer);
    }
}
