//! Transport configuration loading.
//!
//! Settings come from an optional JSON file, then environment variables
//! override individual fields. Protocol constants (TTL, token lifetime) are
//! fixed and deliberately absent here.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

use crate::constants::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT};

/// Configuration for the push HTTP client.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct PushConfig {
    /// Total timeout in seconds for one push request.
    pub request_timeout_secs: u64,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Optional `User-Agent` sent to push services.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT.as_secs(),
            user_agent: None,
        }
    }
}

impl PushConfig {
    /// Loads configuration from a JSON file, with environment variable overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read push config {}", path.display()))?;
        let mut config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Invalid push config {}", path.display()))?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Defaults with environment variable overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Apply `WEB_PUSH_*` environment overrides. Unparsable values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Some(secs) = env_secs("WEB_PUSH_REQUEST_TIMEOUT") {
            self.request_timeout_secs = secs;
        }
        if let Some(secs) = env_secs("WEB_PUSH_CONNECT_TIMEOUT") {
            self.connect_timeout_secs = secs;
        }
        if let Ok(user_agent) = std::env::var("WEB_PUSH_USER_AGENT") {
            self.user_agent = Some(user_agent);
        }
    }

    /// Total request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Connect timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn env_secs(name: &str) -> Option<u64> {
    let value = std::env::var(name).ok()?;
    match value.parse() {
        Ok(secs) => Some(secs),
        Err(e) => {
            log::warn!("[WebPush] Ignoring {name}={value:?}: {e}");
            None
        }
    }
}
