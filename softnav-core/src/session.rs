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

//! Read-only view of the session state owned by another component.

use serde::{Deserialize, Serialize};

/// Session replay recording mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    #[default]
    Off,
    Full,
    Error,
}

impl SessionMode {
    /// Whether interactions finished now have linked replay data.
    pub fn has_replay(self) -> bool {
        !matches!(self, SessionMode::Off)
    }
}

/// Source of the current session mode.
pub trait SessionModeSource: Send {
    fn session_mode(&self) -> SessionMode;
}

impl SessionModeSource for SessionMode {
    fn session_mode(&self) -> SessionMode {
        *self
    }
}

impl<F> SessionModeSource for F
where
    F: Fn() -> SessionMode + Send,
{
    fn session_mode(&self) -> SessionMode {
        self()
    }
}
