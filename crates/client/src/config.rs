use std::path::Path;
use std::time::Duration;

use brokerdesk_core::ApiError;
use serde::{Deserialize, Serialize};

/// Connection settings for the CRM backend.
///
/// Loaded from a TOML file, then overridden by CLI flags / environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// REST root, e.g. `http://localhost:8000`. Paths like `/api/...` are
    /// appended to it.
    pub base_url: String,
    /// WebSocket root. Derived from `base_url` when unset.
    pub ws_url: Option<String>,
    /// Bearer token to start with, if already logged in.
    pub token: Option<String>,
    pub timeout_secs: u64,
    /// REST refresh interval of live views.
    pub poll_interval_secs: u64,
    /// Fixed delay before a dropped WebSocket is reopened.
    pub reconnect_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            ws_url: None,
            token: None,
            timeout_secs: 30,
            poll_interval_secs: 30,
            reconnect_delay_ms: 2000,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ApiError> {
        toml::from_str(content).map_err(|e| ApiError::Config(format!("invalid config: {e}")))
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ApiError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// REST root without a trailing slash.
    pub fn rest_base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// WebSocket root: the configured `ws_url`, or `base_url` with its scheme
    /// switched to `ws://` / `wss://`.
    pub fn ws_base_url(&self) -> Result<String, ApiError> {
        if let Some(ws) = &self.ws_url {
            return Ok(ws.trim_end_matches('/').to_string());
        }
        let base = self.rest_base();
        if let Some(rest) = base.strip_prefix("https://") {
            Ok(format!("wss://{rest}"))
        } else if let Some(rest) = base.strip_prefix("http://") {
            Ok(format!("ws://{rest}"))
        } else {
            Err(ApiError::Config(format!(
                "base_url must start with http:// or https://, got {base}"
            )))
        }
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.timeout_secs == 0 {
            return Err(ApiError::Config("timeout_secs must be positive".to_string()));
        }
        if self.poll_interval_secs == 0 {
            return Err(ApiError::Config(
                "poll_interval_secs must be positive".to_string(),
            ));
        }
        self.ws_base_url().map(|_| ())
    }
}
