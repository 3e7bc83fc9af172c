//! Server endpoint configuration
//!
//! The push-channel URL is derived once from the API URL unless it is given
//! explicitly: `https` becomes `wss`, `http` becomes `ws`.

use url::Url;

use crate::{get_env_or_default, parse_env, ConfigError, ConfigResult};

/// Default API base URL
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Default request timeout enforced on every gateway call
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Quiz server endpoint configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// HTTP base URL, without trailing slash
    pub url: String,

    /// Push channel URL, without trailing slash
    pub websocket_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl ApiConfig {
    /// Load endpoint configuration from environment variables
    ///
    /// - `QUIZ_API_URL` (default `http://localhost:3000`)
    /// - `QUIZ_WEBSOCKET_URL` (optional, derived from the API URL when absent)
    /// - `QUIZ_REQUEST_TIMEOUT` seconds (default 30)
    pub fn from_env() -> ConfigResult<Self> {
        let url = get_env_or_default("QUIZ_API_URL", DEFAULT_API_URL);
        let explicit_ws = std::env::var("QUIZ_WEBSOCKET_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let mut config = Self::new(&url, explicit_ws.as_deref())?;
        config.timeout_secs = parse_env("QUIZ_REQUEST_TIMEOUT", DEFAULT_REQUEST_TIMEOUT_SECS)?;
        if config.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "QUIZ_REQUEST_TIMEOUT must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }

    /// Build a configuration from an API URL and an optional explicit push URL
    pub fn new(api_url: &str, websocket_url: Option<&str>) -> ConfigResult<Self> {
        let url = validate_url("QUIZ_API_URL", api_url, &["http", "https"])?;
        let websocket_url = match websocket_url {
            Some(ws) => validate_url("QUIZ_WEBSOCKET_URL", ws, &["ws", "wss"])?,
            None => derive_websocket_url(&url),
        };

        Ok(Self {
            url,
            websocket_url,
            timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        })
    }

    /// Create a configuration pointing at a custom URL (useful for testing)
    ///
    /// No validation is performed.
    pub fn with_url(url: impl Into<String>) -> Self {
        let url = url.into().trim_end_matches('/').to_string();
        Self {
            websocket_url: derive_websocket_url(&url),
            url,
            timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    /// Get the full URL for an API path
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.url, path.trim_start_matches('/'))
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::with_url(DEFAULT_API_URL)
    }
}

/// Derive the push-channel URL from an HTTP base URL
pub fn derive_websocket_url(api_url: &str) -> String {
    let trimmed = api_url.trim_end_matches('/');
    if let Some(rest) = trimmed.strip_prefix("https") {
        format!("wss{}", rest)
    } else if let Some(rest) = trimmed.strip_prefix("http") {
        format!("ws{}", rest)
    } else {
        trimmed.to_string()
    }
}

fn validate_url(name: &str, raw: &str, schemes: &[&str]) -> ConfigResult<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed =
        Url::parse(trimmed).map_err(|e| ConfigError::InvalidUrl(name.to_string(), e.to_string()))?;

    if !schemes.contains(&parsed.scheme()) {
        return Err(ConfigError::InvalidUrl(
            name.to_string(),
            format!("unsupported scheme '{}'", parsed.scheme()),
        ));
    }

    Ok(trimmed.to_string())
}
