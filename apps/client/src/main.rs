use std::sync::Arc;

use anyhow::Context;
use quizsync_client::{
    Config, CredentialStore, EnvCredentialStore, QuizSession, SessionCredentials, SessionDeps,
    SessionEvent, SessionHandle, WsConnector, TOP_ENTRIES,
};
use quizsync_gateway_client::{GatewayClient, Quiz, ServerGateway};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quizsync_client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    tracing::info!(
        environment = %config.environment(),
        api_url = %config.api().url,
        websocket_url = %config.websocket_url(),
        "Starting quizsync client"
    );

    let store: Arc<dyn CredentialStore> = Arc::new(EnvCredentialStore::from_env());
    let credentials = SessionCredentials::resolve(store.as_ref())
        .context("Participant id and session code are required to join a quiz")?;

    let gateway = Arc::new(GatewayClient::new(config.api())?);
    let quiz = gateway
        .fetch_quiz(&credentials.session_code)
        .await
        .with_context(|| format!("Failed to fetch quiz '{}'", credentials.session_code))?;
    tracing::info!(questions = quiz.len(), "Quiz loaded");

    let deps = SessionDeps {
        gateway,
        connector: Arc::new(WsConnector::new(config.connect_timeout())),
        credential_store: store,
        websocket_url: config.websocket_url().to_string(),
        timing: config.timing().clone(),
    };
    let participant_id = credentials.participant_id;
    let (handle, mut events) = QuizSession::start(deps, credentials, quiz.clone());

    let input = tokio::spawn(read_commands(handle.clone()));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, leaving the quiz");
                handle.exit();
            }
            event = events.recv() => match event {
                Some(SessionEvent::Ended) | None => break,
                Some(event) => log_event(&event, &quiz, participant_id),
            },
        }
    }

    input.abort();
    Ok(())
}

/// Map stdin lines to session commands
///
/// `v` selects true, `f` false, `-` clears the selection, `s` closes the
/// standings view and `q` leaves the quiz.
async fn read_commands(handle: SessionHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let result = match line.trim().to_lowercase().as_str() {
            "v" => handle.select_answer(Some(true)).await,
            "f" => handle.select_answer(Some(false)).await,
            "-" => handle.select_answer(None).await,
            "s" => handle.standings_dismissed().await,
            "q" => {
                handle.exit();
                return;
            }
            "" => continue,
            other => {
                tracing::warn!(input = other, "Unknown command, use v, f, -, s or q");
                continue;
            }
        };

        if result.is_err() {
            return;
        }
    }
}

fn log_event(event: &SessionEvent, quiz: &Quiz, participant_id: u64) {
    match event {
        SessionEvent::QuestionStarted { index, duration } => {
            let prompt = quiz.question(*index).map_or("", |q| q.prompt.as_str());
            tracing::info!(
                question = index + 1,
                total = quiz.len(),
                seconds = duration.as_secs(),
                "{}",
                prompt
            );
        }
        SessionEvent::TimeUp { index, selected } => match selected {
            Some(answer) => tracing::info!(question = index + 1, answer, "Time is over"),
            None => tracing::info!(question = index + 1, "Time is over, no answer given"),
        },
        SessionEvent::Position(position) => {
            tracing::info!(position = %position, "Current position");
        }
        SessionEvent::OwnScore(score) => {
            tracing::info!(score, total = quiz.len(), "Correct answers");
        }
        SessionEvent::Leaderboard(snapshot) => {
            for (rank, entry) in snapshot.top(TOP_ENTRIES).iter().enumerate() {
                tracing::info!(
                    rank = rank + 1,
                    name = %entry.name,
                    score = entry.score,
                    you = entry.participant_id == participant_id,
                    "Leaderboard"
                );
            }
        }
        SessionEvent::PushDegraded => {
            tracing::warn!("Live updates unavailable, following the quiz by polling");
        }
        other => tracing::info!(event = ?other, "Session event"),
    }
}
