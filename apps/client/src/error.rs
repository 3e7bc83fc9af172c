//! Error handling for the quiz client
//!
//! Every network failure is caught by the component it originates in and
//! logged through [`ClientError::log`]; none escape the session driver.

use quizsync_gateway_client::GatewayError;
use quizsync_shared_config::ConfigError;
use thiserror::Error;

/// Quiz client error type
#[derive(Error, Debug)]
pub enum ClientError {
    // ========== Push Channel ==========
    /// Opening the push channel or sending on it failed
    #[error("push channel failure: {0}")]
    ConnectionFailure(String),

    /// The reconnect budget is spent; the push channel stays down
    #[error("push channel gave up after {attempts} reconnect attempts")]
    ExhaustionFailure { attempts: u32 },

    // ========== Server Reads / Writes ==========
    /// Reading the authoritative question index failed
    #[error("could not read the current question index: {0}")]
    ReconciliationReadFailure(#[source] GatewayError),

    /// An answer or score write failed; it is not retried
    #[error("submission for question {question_index} failed: {source}")]
    SubmissionFailure {
        question_index: usize,
        #[source]
        source: GatewayError,
    },

    /// Any other gateway call failed
    #[error("quiz server error: {0}")]
    Gateway(#[from] GatewayError),

    // ========== Session Setup ==========
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Participant id or session code is not stored yet
    #[error("missing session credential: {0}")]
    MissingCredentials(&'static str),

    /// A stored credential cannot be used
    #[error("invalid session credential: {0}")]
    InvalidCredentials(String),

    /// The session driver is gone
    #[error("quiz session is closed")]
    SessionClosed,
}

impl ClientError {
    /// Get a severity level for logging
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Config(_) | Self::InvalidCredentials(_) => ErrorSeverity::Critical,

            Self::ExhaustionFailure { .. } | Self::SubmissionFailure { .. } => {
                ErrorSeverity::Error
            }

            Self::ConnectionFailure(_)
            | Self::ReconciliationReadFailure(_)
            | Self::Gateway(_) => ErrorSeverity::Warning,

            Self::MissingCredentials(_) | Self::SessionClosed => ErrorSeverity::Info,
        }
    }

    /// Component the error originated in
    pub fn component(&self) -> &'static str {
        match self {
            Self::ConnectionFailure(_) | Self::ExhaustionFailure { .. } => "connection",
            Self::ReconciliationReadFailure(_) => "reconciliation",
            Self::SubmissionFailure { .. } => "timer",
            Self::Gateway(_) => "gateway",
            Self::Config(_) | Self::MissingCredentials(_) | Self::InvalidCredentials(_) => {
                "setup"
            }
            Self::SessionClosed => "session",
        }
    }

    /// Log the error with appropriate severity
    pub fn log(&self) {
        let component = self.component();
        match self.severity() {
            ErrorSeverity::Critical => {
                tracing::error!(error = %self, component, "Critical quiz client error");
            }
            ErrorSeverity::Error => {
                tracing::error!(error = %self, component, "Quiz client error");
            }
            ErrorSeverity::Warning => {
                tracing::warn!(error = %self, component, "Quiz client warning");
            }
            ErrorSeverity::Info => {
                tracing::info!(error = %self, component, "Quiz client info");
            }
        }
    }

    /// Create a submission error
    pub fn submission(question_index: usize, source: GatewayError) -> Self {
        Self::SubmissionFailure {
            question_index,
            source,
        }
    }
}

/// Error severity levels for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Critical,
    Error,
    Warning,
    Info,
}

/// Result type alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;
