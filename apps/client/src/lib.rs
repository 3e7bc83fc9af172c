//! Live quiz client kept in step with the quiz server
//!
//! The client follows a shared, timed quiz driven by the server. Progress is
//! tracked through two channels: a push channel managed by
//! [`ConnectionManager`] and a fallback poll of the server's authoritative
//! question index. Both feed the same reducer, [`reconcile`], so duplicate or
//! out-of-order signals converge on one question index.
//!
//! [`QuizSession::start`] runs a whole session and reports progress as
//! [`SessionEvent`]s.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use quizsync_client::{
//!     Config, EnvCredentialStore, QuizSession, SessionCredentials, SessionDeps, WsConnector,
//! };
//! use quizsync_gateway_client::{GatewayClient, ServerGateway};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let store = Arc::new(EnvCredentialStore::from_env());
//! let credentials = SessionCredentials::resolve(store.as_ref())?;
//!
//! let gateway = Arc::new(GatewayClient::new(config.api())?);
//! let quiz = gateway.fetch_quiz(&credentials.session_code).await?;
//!
//! let deps = SessionDeps {
//!     gateway,
//!     connector: Arc::new(WsConnector::new(config.connect_timeout())),
//!     credential_store: store,
//!     websocket_url: config.websocket_url().to_string(),
//!     timing: config.timing().clone(),
//! };
//! let (handle, mut events) = QuizSession::start(deps, credentials, quiz);
//!
//! handle.select_answer(Some(true)).await?;
//! while let Some(event) = events.recv().await {
//!     println!("{:?}", event);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connection;
pub mod credentials;
pub mod error;
pub mod leaderboard;
pub mod position;
pub mod reconcile;
pub mod session;
pub mod timer;

pub use config::Config;
pub use connection::{
    ConnectionManager, ConnectionState, Connector, PushHandle, PushLink, PushMessage,
    ReconnectPolicy, WsConnector,
};
pub use credentials::{
    CredentialStore, EnvCredentialStore, MemoryCredentialStore, SessionCredentials,
};
pub use error::{ClientError, ClientResult, ErrorSeverity};
pub use leaderboard::{LeaderboardPoller, LeaderboardSnapshot, TOP_ENTRIES};
pub use position::Position;
pub use reconcile::{reconcile, AnswerBook, AnswerRecord, Progress, Transition};
pub use session::{QuizSession, SessionDeps, SessionEvent, SessionHandle};
pub use timer::{reading_time, SessionTimer};
