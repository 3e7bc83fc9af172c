//! Client configuration loaded from environment variables

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use quizsync_shared_config::{ApiConfig, CommonConfig, Environment, SessionTiming};

/// Client configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Common configuration shared with the gateway client
    pub common: CommonConfig,

    /// Timeout for opening the push channel, in seconds
    pub connect_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let common = CommonConfig::from_env().context("Failed to load common config")?;

        Ok(Self {
            common,

            connect_timeout_secs: env::var("QUIZ_CONNECT_TIMEOUT")
                .unwrap_or_else(|_| "10".to_string())
                .trim()
                .parse()
                .context("Invalid QUIZ_CONNECT_TIMEOUT value")?,
        })
    }

    pub fn api(&self) -> &ApiConfig {
        &self.common.api
    }

    pub fn timing(&self) -> &SessionTiming {
        &self.common.timing
    }

    /// Push channel URL, derived once at startup
    pub fn websocket_url(&self) -> &str {
        &self.common.api.websocket_url
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn environment(&self) -> Environment {
        self.common.environment
    }

    pub fn is_production(&self) -> bool {
        self.common.environment.is_production()
    }
}
