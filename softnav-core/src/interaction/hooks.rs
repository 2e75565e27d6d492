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

//! Completion callbacks and lifecycle subscriptions.

use std::fmt;
use std::str::FromStr;

use super::Interaction;
use crate::bel::Attributes;
use crate::error::Error;

/// Mutable hand-off shared by every `on_done` callback of one finalize call.
///
/// Callbacks run in registration order and see each other's writes. After the
/// last one, `attributes` are written onto the interaction and
/// `has_replay` becomes the `hasReplay` attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DoneContext {
    pub has_replay: bool,
    pub attributes: Attributes,
}

pub type DoneCallback = Box<dyn FnOnce(&mut DoneContext) + Send>;
pub type EventCallback = Box<dyn FnOnce(&Interaction) + Send>;

/// Lifecycle events an external feature can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionEvent {
    Finished,
    Cancelled,
}

impl FromStr for InteractionEvent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "finished" => Ok(InteractionEvent::Finished),
            "cancelled" => Ok(InteractionEvent::Cancelled),
            other => Err(Error::UnknownEvent(other.to_string())),
        }
    }
}

impl fmt::Display for InteractionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InteractionEvent::Finished => write!(f, "finished"),
            InteractionEvent::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Callbacks registered against one open interaction.
///
/// Hooks are consumed when the interaction reaches a terminal status, which
/// is what makes every callback run at most once.
#[derive(Default)]
pub struct InteractionHooks {
    on_done: Vec<DoneCallback>,
    finished: Vec<EventCallback>,
    cancelled: Vec<EventCallback>,
}

impl InteractionHooks {
    pub fn on_done(&mut self, callback: DoneCallback) {
        self.on_done.push(callback);
    }

    pub fn subscribe(&mut self, event: InteractionEvent, callback: EventCallback) {
        match event {
            InteractionEvent::Finished => self.finished.push(callback),
            InteractionEvent::Cancelled => self.cancelled.push(callback),
        }
    }

    /// Run `on_done` callbacks with one shared context and return it.
    pub(crate) fn run_on_done(&mut self, mut context: DoneContext) -> DoneContext {
        for callback in self.on_done.drain(..) {
            callback(&mut context);
        }
        context
    }

    pub(crate) fn notify(&mut self, event: InteractionEvent, interaction: &Interaction) {
        let callbacks = match event {
            InteractionEvent::Finished => std::mem::take(&mut self.finished),
            InteractionEvent::Cancelled => std::mem::take(&mut self.cancelled),
        };
        for callback in callbacks {
            callback(interaction);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.on_done.is_empty() && self.finished.is_empty() && self.cancelled.is_empty()
    }
}

impl fmt::Debug for InteractionHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractionHooks")
            .field("on_done", &self.on_done.len())
            .field("finished", &self.finished.len())
            .field("cancelled", &self.cancelled.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_names() {
        assert_eq!("finished".parse::<InteractionEvent>().unwrap(), InteractionEvent::Finished);
        assert_eq!("cancelled".parse::<InteractionEvent>().unwrap(), InteractionEvent::Cancelled);
        assert_eq!(
            "done".parse::<InteractionEvent>(),
            Err(Error::UnknownEvent("done".to_string()))
        );
    }

    #[test]
    fn test_on_done_shares_context() {
        let mut hooks = InteractionHooks::default();
        hooks.on_done(Box::new(|ctx| {
            ctx.attributes.insert("step".into(), json!(1));
        }));
        hooks.on_done(Box::new(|ctx| {
            let seen = ctx.attributes.get("step").cloned();
            ctx.attributes.insert("saw_step".into(), json!(seen.is_some()));
            ctx.has_replay = true;
        }));

        let ctx = hooks.run_on_done(DoneContext::default());
        assert_eq!(ctx.attributes.get("saw_step"), Some(&json!(true)));
        assert!(ctx.has_replay);
        assert!(hooks.is_empty());
    }
}
