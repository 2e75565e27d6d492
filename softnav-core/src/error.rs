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

//! Error types for softnav core.
//!
//! Only programmer misuse surfaces here. Malformed telemetry input and
//! out-of-order signals degrade silently instead of producing errors.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Unknown interaction event '{0}', expected 'finished' or 'cancelled'")]
    UnknownEvent(String),

    #[error("Interaction {0} is not open")]
    InteractionClosed(String),

    #[error("No interaction with id {0}")]
    NoInteraction(String),

    #[error("Harvest already in flight: settle the previous backup before taking another snapshot")]
    HarvestInFlight,

    #[error("No harvest backup to restore")]
    NoBackup,
}

pub type Result<T> = std::result::Result<T, Error>;
