//! Gateway error types

use thiserror::Error;

/// Errors returned by Server Gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Invalid input provided to a gateway method
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("Failed to parse quiz server response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Quiz server answered with a non-success status
    #[error("Quiz server returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Request timeout
    #[error("Request to quiz server timed out")]
    Timeout,

    /// The gateway is not reachable (used by in-memory gateways)
    #[error("Quiz server unavailable: {0}")]
    Unavailable(String),
}

impl GatewayError {
    /// Check if this error is transient
    ///
    /// Transport failures, timeouts and 5xx responses are transient; 4xx
    /// responses and malformed payloads are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Timeout | GatewayError::Unavailable(_) => true,
            GatewayError::Status { status, .. } => *status >= 500,
            GatewayError::Http(e) => {
                if e.is_timeout() || e.is_connect() {
                    return true;
                }
                matches!(e.status(), Some(status) if status.is_server_error())
            }
            _ => false,
        }
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;
