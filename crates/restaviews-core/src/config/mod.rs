//! Client configuration.
//!
//! `ClientConfig` collects the remote API endpoint and the replay tuning
//! knobs. Values come from defaults, then environment overrides, then
//! validation.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:1337";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_REPLAY_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_REPLAY_BACKOFF_MS: u64 = 500;

pub const ENV_API_URL: &str = "RESTAVIEWS_API_URL";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "RESTAVIEWS_REQUEST_TIMEOUT_SECS";
pub const ENV_REPLAY_MAX_ATTEMPTS: &str = "RESTAVIEWS_REPLAY_MAX_ATTEMPTS";
pub const ENV_REPLAY_BACKOFF_MS: &str = "RESTAVIEWS_REPLAY_BACKOFF_MS";

/// Remote API and replay settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct ClientConfig {
    /// Base URL of the restaurant API, without a trailing slash
    pub api_base_url: String,
    /// Per-request timeout for the HTTP client
    pub request_timeout_secs: u64,
    /// Replay attempts per trigger before the worker waits for the next one
    pub replay_max_attempts: u32,
    /// Base delay between replay attempts; attempt `n` waits `n` times this
    pub replay_backoff_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            replay_max_attempts: DEFAULT_REPLAY_MAX_ATTEMPTS,
            replay_backoff_ms: DEFAULT_REPLAY_BACKOFF_MS,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `RESTAVIEWS_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(url) = normalize_text_option(lookup(ENV_API_URL)) {
            config.api_base_url = url;
        }
        if let Some(value) = normalize_text_option(lookup(ENV_REQUEST_TIMEOUT_SECS)) {
            config.request_timeout_secs = parse_number(ENV_REQUEST_TIMEOUT_SECS, &value)?;
        }
        if let Some(value) = normalize_text_option(lookup(ENV_REPLAY_MAX_ATTEMPTS)) {
            config.replay_max_attempts = parse_number(ENV_REPLAY_MAX_ATTEMPTS, &value)?;
        }
        if let Some(value) = normalize_text_option(lookup(ENV_REPLAY_BACKOFF_MS)) {
            config.replay_backoff_ms = parse_number(ENV_REPLAY_BACKOFF_MS, &value)?;
        }

        config.validated()
    }

    /// Normalise the base URL and check the numeric bounds.
    pub fn validated(mut self) -> Result<Self> {
        let url = normalize_text_option(Some(self.api_base_url))
            .ok_or_else(|| Error::InvalidInput("api_base_url is required".to_string()))?;
        if !is_http_url(&url) {
            return Err(Error::InvalidInput(format!(
                "api_base_url must include http:// or https:// (got '{url}')"
            )));
        }
        self.api_base_url = url.trim_end_matches('/').to_string();

        if self.request_timeout_secs == 0 {
            return Err(Error::InvalidInput(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.replay_max_attempts == 0 {
            return Err(Error::InvalidInput(
                "replay_max_attempts must be at least 1".to_string(),
            ));
        }

        Ok(self)
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn replay_backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.replay_backoff_ms.saturating_mul(u64::from(attempt)))
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::InvalidInput(format!("{key} must be a whole number (got '{value}')")))
}
