//! Participant position shown between questions

use std::fmt;

use quizsync_gateway_client::GatewayResult;

/// Result of a rank lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Lookup scheduled or in flight
    Pending,
    /// 1-based rank
    Ranked(u32),
    /// The server could not place the participant
    Unknown,
    /// The lookup itself failed
    Failed,
}

impl Position {
    /// Map a rank lookup to a position; failures are logged here
    pub fn from_lookup(result: GatewayResult<Option<u32>>) -> Self {
        match result {
            Ok(Some(rank)) => Self::Ranked(rank),
            Ok(None) => Self::Unknown,
            Err(e) => {
                tracing::warn!(error = %e, "Position lookup failed");
                Self::Failed
            }
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "…"),
            Self::Ranked(rank) => write!(f, "{}", rank),
            Self::Unknown => write!(f, "N/A"),
            Self::Failed => write!(f, "error"),
        }
    }
}
