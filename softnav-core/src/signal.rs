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

//! Signals emitted by page instrumentation
//!
//! Each signal is a discrete observation with a timestamp in milliseconds on
//! the page's time origin. The controller consumes them in delivery order.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Signal {
    /// A user action (click, keydown, submit, popstate, ...).
    UiEvent {
        kind: String,
        timestamp: f64,
        /// Visible text of the element a click landed on.
        #[serde(default)]
        action_text: Option<String>,
    },
    /// The visible URL changed.
    UrlChange { timestamp: f64, url: String },
    /// The document was mutated.
    DomMutation { timestamp: f64 },
    /// A long task was observed after it completed.
    LongTask { start: f64, end: f64 },
}

impl Signal {
    pub fn ui_event(kind: impl Into<String>, timestamp: f64) -> Self {
        Signal::UiEvent {
            kind: kind.into(),
            timestamp,
            action_text: None,
        }
    }

    pub fn click(timestamp: f64, action_text: impl Into<String>) -> Self {
        Signal::UiEvent {
            kind: "click".to_string(),
            timestamp,
            action_text: Some(action_text.into()),
        }
    }

    pub fn url_change(timestamp: f64, url: impl Into<String>) -> Self {
        Signal::UrlChange {
            timestamp,
            url: url.into(),
        }
    }

    pub fn dom_mutation(timestamp: f64) -> Self {
        Signal::DomMutation { timestamp }
    }

    pub fn long_task(start: f64, end: f64) -> Self {
        Signal::LongTask { start, end }
    }

    /// When the signal was observed. Long tasks are observed when they end.
    pub fn timestamp(&self) -> f64 {
        match self {
            Signal::UiEvent { timestamp, .. }
            | Signal::UrlChange { timestamp, .. }
            | Signal::DomMutation { timestamp } => *timestamp,
            Signal::LongTask { end, .. } => *end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamps() {
        assert_eq!(Signal::ui_event("keydown", 100.0).timestamp(), 100.0);
        assert_eq!(Signal::long_task(400.0, 500.0).timestamp(), 500.0);
    }

    #[test]
    fn test_json_shape() {
        let signal: Signal =
            serde_json::from_str(r#"{"type":"ui_event","kind":"click","timestamp":12.5}"#).unwrap();
        assert_eq!(signal, Signal::ui_event("click", 12.5));

        let encoded = serde_json::to_string(&Signal::dom_mutation(3.0)).unwrap();
        assert_eq!(encoded, r#"{"type":"dom_mutation","timestamp":3.0}"#);
    }
}
