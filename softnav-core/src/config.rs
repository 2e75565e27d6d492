// Copyright 2025 AgentReplay (https://github.com/agentreplay)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Configuration for interaction lifecycle timing
//!
//! All windows are expressed in milliseconds on the page's time origin, the
//! same clock every signal timestamp uses.

use serde::{Deserialize, Serialize};

/// Default window after an interaction's start in which a `popstate`
/// trigger is folded into it instead of opening a new interaction.
pub const DEFAULT_POPSTATE_MERGE_WINDOW_MS: u64 = 500;

/// Default time an interaction may stay in progress before it is cancelled.
pub const DEFAULT_CANCEL_TIMEOUT_MS: u64 = 30_000;

/// Default quiet period with no long task before a pending interaction finishes.
pub const DEFAULT_LONG_TASK_WINDOW_MS: u64 = 5_000;

/// Default coalescing window for rapid successive URL changes.
pub const DEFAULT_URL_DEBOUNCE_MS: u64 = 50;

/// Timing configuration for the interaction lifecycle controller
///
/// - Production: use defaults
/// - Testing: `immediate_url_changes()` removes the URL debounce so history
///   signals apply synchronously
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Popstate merge window in milliseconds.
    pub popstate_merge_window_ms: u64,

    /// Auto-cancel timeout for interactions that never reach pending-finish.
    pub cancel_timeout_ms: u64,

    /// Long-task watch window in milliseconds.
    pub long_task_window_ms: u64,

    /// URL change debounce in milliseconds. Zero applies changes immediately.
    pub url_debounce_ms: u64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            popstate_merge_window_ms: DEFAULT_POPSTATE_MERGE_WINDOW_MS,
            cancel_timeout_ms: DEFAULT_CANCEL_TIMEOUT_MS,
            long_task_window_ms: DEFAULT_LONG_TASK_WINDOW_MS,
            url_debounce_ms: DEFAULT_URL_DEBOUNCE_MS,
        }
    }
}

impl InteractionConfig {
    /// Defaults with the URL debounce disabled.
    pub fn immediate_url_changes() -> Self {
        Self {
            url_debounce_ms: 0,
            ..Self::default()
        }
    }

    pub fn with_popstate_merge_window(mut self, ms: u64) -> Self {
        self.popstate_merge_window_ms = ms;
        self
    }

    pub fn with_cancel_timeout(mut self, ms: u64) -> Self {
        self.cancel_timeout_ms = ms;
        self
    }

    pub fn with_long_task_window(mut self, ms: u64) -> Self {
        self.long_task_window_ms = ms;
        self
    }

    pub fn with_url_debounce(mut self, ms: u64) -> Self {
        self.url_debounce_ms = ms;
        self
    }

    pub(crate) fn popstate_merge_window(&self) -> f64 {
        self.popstate_merge_window_ms as f64
    }

    pub(crate) fn cancel_timeout(&self) -> f64 {
        self.cancel_timeout_ms as f64
    }

    pub(crate) fn long_task_window(&self) -> f64 {
        self.long_task_window_ms as f64
    }

    pub(crate) fn url_debounce(&self) -> f64 {
        self.url_debounce_ms as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = InteractionConfig::default();
        assert_eq!(config.popstate_merge_window_ms, 500);
        assert_eq!(config.cancel_timeout_ms, 30_000);
        assert_eq!(config.long_task_window_ms, 5_000);
        assert_eq!(config.url_debounce_ms, 50);
    }

    #[test]
    fn test_immediate_url_changes() {
        let config = InteractionConfig::immediate_url_changes();
        assert_eq!(config.url_debounce_ms, 0);
        assert_eq!(config.long_task_window_ms, DEFAULT_LONG_TASK_WINDOW_MS);
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: InteractionConfig =
            serde_json::from_str(r#"{"long_task_window_ms": 1000}"#).unwrap();
        assert_eq!(config.long_task_window_ms, 1000);
        assert_eq!(config.cancel_timeout_ms, DEFAULT_CANCEL_TIMEOUT_MS);
    }
}
