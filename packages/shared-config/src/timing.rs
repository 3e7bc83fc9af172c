//! Session timing configuration

use std::time::Duration;

use crate::{parse_env, ConfigError, ConfigResult};

/// Intervals, delays and limits that drive a live quiz session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTiming {
    /// Keep-alive interval on the push channel
    pub keepalive: Duration,

    /// Reconciliation poll interval
    pub poll_interval: Duration,

    /// Leaderboard poll interval after the quiz finishes
    pub leaderboard_interval: Duration,

    /// Reconnect budget for the push channel
    pub max_reconnect_attempts: u32,

    /// First reconnect delay; doubles on every attempt
    pub backoff_base: Duration,

    /// Upper bound for a single reconnect delay
    pub backoff_cap: Duration,

    /// Delay before the rank lookup that follows an answered question
    pub position_delay: Duration,

    /// Delay before the rank lookup on the standings view
    pub standings_delay: Duration,
}

impl SessionTiming {
    /// Load session timing from environment variables
    pub fn from_env() -> ConfigResult<Self> {
        let timing = Self {
            keepalive: Duration::from_secs(parse_env("QUIZ_KEEPALIVE_SECS", 25)?),
            poll_interval: Duration::from_millis(parse_env("QUIZ_POLL_INTERVAL_MS", 3000)?),
            leaderboard_interval: Duration::from_millis(parse_env(
                "QUIZ_LEADERBOARD_INTERVAL_MS",
                3000,
            )?),
            max_reconnect_attempts: parse_env("QUIZ_MAX_RECONNECT_ATTEMPTS", 5)?,
            backoff_base: Duration::from_millis(parse_env("QUIZ_BACKOFF_BASE_MS", 500)?),
            backoff_cap: Duration::from_millis(parse_env("QUIZ_BACKOFF_CAP_MS", 10_000)?),
            position_delay: Duration::from_millis(parse_env("QUIZ_POSITION_DELAY_MS", 3000)?),
            standings_delay: Duration::from_millis(parse_env("QUIZ_STANDINGS_DELAY_MS", 1000)?),
        };
        timing.validate()?;
        Ok(timing)
    }

    /// Reject intervals that would spin
    pub fn validate(&self) -> ConfigResult<()> {
        let intervals = [
            ("QUIZ_KEEPALIVE_SECS", self.keepalive),
            ("QUIZ_POLL_INTERVAL_MS", self.poll_interval),
            ("QUIZ_LEADERBOARD_INTERVAL_MS", self.leaderboard_interval),
            ("QUIZ_BACKOFF_BASE_MS", self.backoff_base),
        ];

        for (name, value) in intervals {
            if value.is_zero() {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be greater than zero",
                    name
                )));
            }
        }

        if self.backoff_cap < self.backoff_base {
            return Err(ConfigError::ValidationError(
                "QUIZ_BACKOFF_CAP_MS must not be below QUIZ_BACKOFF_BASE_MS".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            keepalive: Duration::from_secs(25),
            poll_interval: Duration::from_secs(3),
            leaderboard_interval: Duration::from_secs(3),
            max_reconnect_attempts: 5,
            backoff_base: Duration::from_millis(500),
            backoff_cap: Duration::from_secs(10),
            position_delay: Duration::from_secs(3),
            standings_delay: Duration::from_secs(1),
        }
    }
}
