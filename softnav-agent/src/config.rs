// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Agent configuration
//!
//! Loaded from a TOML file or from defaults, then overridden by `SOFTNAV_*`
//! environment variables.

use std::env;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use softnav_core::InteractionConfig;

use crate::error::AgentError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Collector URL payloads are POSTed to.
    pub endpoint: String,

    /// Sent as `X-Api-Key` when present.
    pub api_key: Option<String>,

    /// URL of the page the agent runs on.
    pub page_url: String,

    /// Time between harvest cycles.
    pub harvest_interval_ms: u64,

    /// Time between timer sweeps of the controller.
    pub tick_interval_ms: u64,

    /// Capacity of the signal channel.
    pub channel_capacity: usize,

    /// Per-request timeout for the HTTP transport.
    pub request_timeout_ms: u64,

    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_filter: String,

    pub interaction: InteractionConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/events/1".to_string(),
            api_key: None,
            page_url: "about:blank".to_string(),
            harvest_interval_ms: 10_000,
            tick_interval_ms: 10,
            channel_capacity: 1000,
            request_timeout_ms: 30_000,
            log_filter: "info".to_string(),
            interaction: InteractionConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Load configuration from a TOML file. Missing keys take defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Defaults overridden by environment variables.
    ///
    /// Supported environment variables:
    /// - SOFTNAV_ENDPOINT: collector URL
    /// - SOFTNAV_API_KEY: collector API key
    /// - SOFTNAV_PAGE_URL: URL of the instrumented page
    /// - SOFTNAV_HARVEST_INTERVAL_MS: harvest period (default: 10000)
    /// - SOFTNAV_TICK_INTERVAL_MS: timer sweep period (default: 10)
    /// - SOFTNAV_REQUEST_TIMEOUT_MS: HTTP timeout (default: 30000)
    /// - SOFTNAV_LOG: default log filter (default: info)
    /// - SOFTNAV_CANCEL_TIMEOUT_MS, SOFTNAV_LONG_TASK_WINDOW_MS,
    ///   SOFTNAV_POPSTATE_MERGE_WINDOW_MS, SOFTNAV_URL_DEBOUNCE_MS: lifecycle windows
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(endpoint) = env::var("SOFTNAV_ENDPOINT") {
            self.endpoint = endpoint;
        }
        if let Ok(key) = env::var("SOFTNAV_API_KEY") {
            self.api_key = Some(key);
        }
        if let Ok(url) = env::var("SOFTNAV_PAGE_URL") {
            self.page_url = url;
        }
        if let Ok(filter) = env::var("SOFTNAV_LOG") {
            self.log_filter = filter;
        }

        override_number("SOFTNAV_HARVEST_INTERVAL_MS", &mut self.harvest_interval_ms);
        override_number("SOFTNAV_TICK_INTERVAL_MS", &mut self.tick_interval_ms);
        override_number("SOFTNAV_REQUEST_TIMEOUT_MS", &mut self.request_timeout_ms);

        let interaction = &mut self.interaction;
        override_number("SOFTNAV_CANCEL_TIMEOUT_MS", &mut interaction.cancel_timeout_ms);
        override_number("SOFTNAV_LONG_TASK_WINDOW_MS", &mut interaction.long_task_window_ms);
        override_number(
            "SOFTNAV_POPSTATE_MERGE_WINDOW_MS",
            &mut interaction.popstate_merge_window_ms,
        );
        override_number("SOFTNAV_URL_DEBOUNCE_MS", &mut interaction.url_debounce_ms);
    }

    pub fn validate(&self) -> Result<(), AgentError> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(AgentError::Config(format!(
                "endpoint must be an http(s) URL, got '{}'",
                self.endpoint
            )));
        }
        if self.harvest_interval_ms == 0 || self.tick_interval_ms == 0 {
            return Err(AgentError::Config(
                "harvest and tick intervals must be non-zero".to_string(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(AgentError::Config("channel_capacity must be non-zero".to_string()));
        }
        Ok(())
    }

    pub fn harvest_interval(&self) -> Duration {
        Duration::from_millis(self.harvest_interval_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn override_number(var: &str, target: &mut u64) {
    if let Ok(raw) = env::var(var) {
        match raw.parse() {
            Ok(value) => *target = value,
            Err(_) => tracing::warn!(var, value = %raw, "Ignoring non-numeric override"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AgentConfig::default();
        assert_eq!(config.harvest_interval(), Duration::from_secs(10));
        assert_eq!(config.interaction, InteractionConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
endpoint = "https://collector.test/events/1"
harvest_interval_ms = 5000

[interaction]
long_task_window_ms = 2000
"#
        )
        .unwrap();

        let config = AgentConfig::from_file(file.path()).unwrap();
        assert_eq!(config.endpoint, "https://collector.test/events/1");
        assert_eq!(config.harvest_interval_ms, 5000);
        assert_eq!(config.interaction.long_task_window_ms, 2000);
        assert_eq!(config.interaction.cancel_timeout_ms, 30_000);
        assert_eq!(config.tick_interval_ms, 10);
    }

    #[test]
    fn test_from_file_missing() {
        let err = AgentConfig::from_file("/nonexistent/softnav.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_env_overrides() {
        env::set_var("SOFTNAV_HARVEST_INTERVAL_MS", "2500");
        env::set_var("SOFTNAV_URL_DEBOUNCE_MS", "not-a-number");
        let config = AgentConfig::from_env();
        assert_eq!(config.harvest_interval_ms, 2500);
        assert_eq!(config.interaction.url_debounce_ms, 50);
        env::remove_var("SOFTNAV_HARVEST_INTERVAL_MS");
        env::remove_var("SOFTNAV_URL_DEBOUNCE_MS");
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let config = AgentConfig {
            endpoint: "ftp://collector.test".to_string(),
            ..AgentConfig::default()
        };
        assert!(matches!(config.validate(), Err(AgentError::Config(_))));
    }
}
