//! End-to-end session over the HTTP gateway
//!
//! Runs on real time against a wiremock quiz server, with short intervals so
//! the final leaderboard arrives quickly.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{credentials, MockConnector, PARTICIPANT_ID, SESSION_CODE};
use quizsync_client::{MemoryCredentialStore, QuizSession, SessionDeps, SessionEvent};
use quizsync_gateway_client::{GatewayClient, QuestionId, ServerGateway};
use quizsync_shared_config::{ApiConfig, SessionTiming};
use quizsync_test_utils::MockQuizServer;

fn fast_timing() -> SessionTiming {
    SessionTiming {
        poll_interval: Duration::from_millis(50),
        leaderboard_interval: Duration::from_millis(50),
        position_delay: Duration::from_millis(20),
        standings_delay: Duration::from_millis(20),
        ..SessionTiming::default()
    }
}

#[tokio::test]
async fn test_session_over_http_reaches_leaderboard() {
    let server = MockQuizServer::start().await;
    server
        .mock_quiz(
            SESSION_CODE,
            &[
                ("Rust has a garbage collector", false),
                ("Cargo builds crates", true),
            ],
        )
        .await;
    server.mock_join().await;
    server.mock_current_index(2).await;
    server
        .mock_leaderboard(&[(PARTICIPANT_ID, "Grace", 2), (9, "Linus", 1)])
        .await;

    let gateway = Arc::new(GatewayClient::new(&ApiConfig::with_url(server.url())).unwrap());
    let quiz = gateway.fetch_quiz(SESSION_CODE).await.unwrap();
    assert_eq!(quiz.len(), 2);
    assert_eq!(
        quiz.question(0).unwrap().id,
        Some(QuestionId::Text("q0".to_string()))
    );
    assert!(!quiz.question(0).unwrap().correct_answer);

    let (connector, mut links) = MockConnector::accepting();
    let store = Arc::new(MemoryCredentialStore::new(
        PARTICIPANT_ID.to_string(),
        SESSION_CODE,
    ));
    let deps = SessionDeps {
        gateway,
        connector,
        credential_store: store.clone(),
        websocket_url: ApiConfig::with_url(server.url()).websocket_url,
        timing: fast_timing(),
    };
    let (handle, mut events) = QuizSession::start(deps, credentials(), quiz);

    // The server already moved past the last question
    let link = links.recv().await.unwrap();
    link.push("nova-questao").await;

    let mut finished = false;
    let snapshot = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            match events.recv().await {
                Some(SessionEvent::Finished) => finished = true,
                Some(SessionEvent::Leaderboard(snapshot)) => return snapshot,
                Some(_) => {}
                None => panic!("session ended early"),
            }
        }
    })
    .await
    .expect("no leaderboard within 10s");

    assert!(finished);
    assert_eq!(snapshot.position_of(PARTICIPANT_ID), Some(1));
    assert_eq!(snapshot.top(10).len(), 2);
    assert!(server.request_count("/conectarAluno").await >= 2);
    assert_eq!(server.request_count("/salvaRespostaUnica").await, 0);

    handle.exit();
    handle.closed().await;
    assert!(store.is_empty());
}
