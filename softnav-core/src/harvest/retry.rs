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

//! Collector status classification.

use serde::{Deserialize, Serialize};

/// How a collector HTTP status is treated by the harvest queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusClass {
    Success,
    /// The batch is restored and resent on the next cycle.
    Retryable,
    /// The batch is dropped.
    Terminal,
    /// Not in the collector's status table. Dropped like `Terminal`.
    Unlisted,
}

impl StatusClass {
    pub fn is_retryable(self) -> bool {
        matches!(self, StatusClass::Retryable)
    }
}

pub fn classify(status: u16) -> StatusClass {
    match status {
        200..=299 => StatusClass::Success,
        408 | 429 | 500 | 503 => StatusClass::Retryable,
        400 | 404 | 502 | 504 | 512 => StatusClass::Terminal,
        _ => StatusClass::Unlisted,
    }
}

/// Outcome of handing one payload to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportResult {
    /// The request reached the collector and a status came back.
    pub sent: bool,
    /// The status is retry-eligible.
    pub retry: bool,
    pub status_code: Option<u16>,
}

impl TransportResult {
    pub fn from_status(status: u16) -> Self {
        Self {
            sent: true,
            retry: classify(status).is_retryable(),
            status_code: Some(status),
        }
    }

    /// The request never completed (network error, aborted, no transport).
    pub fn not_sent() -> Self {
        Self {
            sent: false,
            retry: false,
            status_code: None,
        }
    }

    pub fn class(&self) -> Option<StatusClass> {
        self.status_code.map(classify)
    }

    /// Whether the harvested batch must go back into the queue.
    pub fn should_restore(&self) -> bool {
        !self.sent || self.retry
    }
}
