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

//! Interaction lifecycle state machine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractionStatus {
    InProgress,
    PendingFinish,
    Finished,
    Cancelled,
}

impl InteractionStatus {
    /// Open interactions still accept signals.
    pub fn is_open(self) -> bool {
        matches!(self, InteractionStatus::InProgress | InteractionStatus::PendingFinish)
    }

    pub fn is_terminal(self) -> bool {
        !self.is_open()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    /// Both the DOM and the history completion signal have been seen.
    CompletionSignals,
    Finish,
    Cancel,
}

#[derive(Debug, Error)]
#[error("Invalid transition: {current:?} -> {event:?}")]
pub struct InvalidTransition {
    pub current: InteractionStatus,
    pub event: StatusEvent,
}

impl InteractionStatus {
    pub fn transition(self, event: StatusEvent) -> Result<InteractionStatus, InvalidTransition> {
        use InteractionStatus::*;
        use StatusEvent::*;

        let next = match (self, event) {
            (InProgress, CompletionSignals) => PendingFinish,
            (s, Finish) if s.is_open() => Finished,
            (s, Cancel) if s.is_open() => Cancelled,
            _ => {
                return Err(InvalidTransition {
                    current: self,
                    event,
                })
            }
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let status = InteractionStatus::InProgress
            .transition(StatusEvent::CompletionSignals)
            .unwrap();
        assert_eq!(status, InteractionStatus::PendingFinish);
        assert_eq!(
            status.transition(StatusEvent::Finish).unwrap(),
            InteractionStatus::Finished
        );
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        for terminal in [InteractionStatus::Finished, InteractionStatus::Cancelled] {
            assert!(terminal.is_terminal());
            assert!(terminal.transition(StatusEvent::Finish).is_err());
            assert!(terminal.transition(StatusEvent::Cancel).is_err());
            assert!(terminal.transition(StatusEvent::CompletionSignals).is_err());
        }
    }

    #[test]
    fn test_pending_finish_cannot_reenter() {
        assert!(InteractionStatus::PendingFinish
            .transition(StatusEvent::CompletionSignals)
            .is_err());
    }
}
