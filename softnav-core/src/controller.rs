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

//! Interaction lifecycle controller
//!
//! The controller owns at most one open interaction, the initial-page-load
//! interaction until the page finishes loading, the timer queue, and the
//! harvest queue of finished interactions.
//!
//! Time only moves through signal timestamps and [`InteractionController::advance_to`].
//! Every entry point first fires the timers due at its own timestamp, so a
//! timer that expires before a signal is always handled before it.
//!
//! ```text
//! InProgress --(dom + history)--> PendingFinish --(watch expires)--> Finished
//!     |                                 |
//!     +--(auto-cancel / replaced)--> Cancelled   (replaced) --> Finished
//! ```

use std::collections::HashMap;

use serde_json::Value;

use crate::bel::{Attributes, Obfuscator};
use crate::config::InteractionConfig;
use crate::error::{Error, Result};
use crate::harvest::{
    serialize_payload, HarvestDisposition, HarvestPayload, HarvestQueue, SnapshotMode,
    TransportResult,
};
use crate::ids::NodeIdGenerator;
use crate::interaction::{
    DoneContext, Interaction, InteractionEvent, InteractionHooks, InteractionStatus,
    PageLoadTimings, StatusEvent, API_TRIGGER, POPSTATE_TRIGGER,
};
use crate::node::{AjaxNode, CustomEndNode, CustomTracerNode, Node};
use crate::session::{SessionMode, SessionModeSource};
use crate::signal::Signal;
use crate::timer::{TimerKind, TimerQueue};

const CLICK_TRIGGER: &str = "click";
const ACTION_TEXT_ATTRIBUTE: &str = "actionText";
const HAS_REPLAY_ATTRIBUTE: &str = "hasReplay";

/// Where a child node for a given timestamp belongs.
#[derive(Debug, Clone, Copy)]
enum Slot {
    Open,
    Queued(usize),
    InitialPageLoad,
}

pub struct InteractionController {
    config: InteractionConfig,
    ids: NodeIdGenerator,
    timers: TimerQueue,
    now: f64,
    initial_page_url: String,
    latest_url: String,
    /// Route name last set through the API; becomes `old_route` of the next
    /// interaction.
    latest_route: Option<String>,
    open: Option<Interaction>,
    initial_page_load: Option<Interaction>,
    hooks: HashMap<String, InteractionHooks>,
    page_attributes: Attributes,
    session: Box<dyn SessionModeSource>,
    queue: HarvestQueue<Interaction>,
}

impl InteractionController {
    /// Create a controller for a page loaded at `page_url`. The
    /// initial-page-load interaction is created immediately.
    pub fn new(config: InteractionConfig, page_url: impl Into<String>) -> Self {
        let page_url = page_url.into();
        let mut ids = NodeIdGenerator::new();
        let initial_page_load = Interaction::initial_page_load(ids.next_id(), page_url.clone());

        Self {
            config,
            ids,
            timers: TimerQueue::new(),
            now: 0.0,
            initial_page_url: page_url.clone(),
            latest_url: page_url,
            latest_route: None,
            open: None,
            initial_page_load: Some(initial_page_load),
            hooks: HashMap::new(),
            page_attributes: Attributes::new(),
            session: Box::new(SessionMode::Off),
            queue: HarvestQueue::new(),
        }
    }

    pub fn with_session_source(mut self, source: impl SessionModeSource + 'static) -> Self {
        self.session = Box::new(source);
        self
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    /// Latest time the controller has seen.
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn latest_url(&self) -> &str {
        &self.latest_url
    }

    pub fn open_interaction(&self) -> Option<&Interaction> {
        self.open.as_ref()
    }

    /// The initial-page-load interaction, until it finishes.
    pub fn initial_page_load(&self) -> Option<&Interaction> {
        self.initial_page_load.as_ref()
    }

    pub fn queue(&self) -> &HarvestQueue<Interaction> {
        &self.queue
    }

    pub fn next_timer_deadline(&self) -> Option<f64> {
        self.timers.next_deadline()
    }

    pub fn handle(&mut self, signal: Signal) {
        match signal {
            Signal::UiEvent {
                kind,
                timestamp,
                action_text,
            } => self.ui_event(&kind, timestamp, action_text),
            Signal::UrlChange { timestamp, url } => self.url_change(timestamp, url),
            Signal::DomMutation { timestamp } => self.dom_mutation(timestamp),
            Signal::LongTask { start, end } => self.long_task(start, end),
        }
    }

    /// Fire every timer due at or before `now`, in deadline order.
    pub fn advance_to(&mut self, now: f64) {
        while let Some(fired) = self.timers.pop_due(now) {
            self.now = self.now.max(fired.deadline);
            tracing::trace!(deadline = fired.deadline, kind = ?fired.kind, "Timer fired");
            self.on_timer(fired.kind);
        }
        self.now = self.now.max(now);
    }

    pub fn ui_event(&mut self, kind: &str, timestamp: f64, action_text: Option<String>) {
        self.advance_to(timestamp);
        tracing::trace!(kind, timestamp, "UI event");

        if let Some(open) = self.open.as_ref() {
            if open.created_by_api {
                tracing::trace!(id = open.id(), "Open interaction was created by the API, ignoring UI event");
                return;
            }
            if kind == POPSTATE_TRIGGER
                && timestamp - open.start() <= self.config.popstate_merge_window()
            {
                tracing::debug!(
                    id = open.id(),
                    trigger = %open.trigger,
                    "Merged popstate into open interaction"
                );
                return;
            }
            self.replace_open();
        }

        let mut interaction = Interaction::new(
            self.ids.next_id(),
            kind,
            timestamp,
            self.initial_page_url.clone(),
            self.latest_url.clone(),
        );
        interaction.old_route = self.latest_route.clone();
        if kind == CLICK_TRIGGER {
            if let Some(text) = action_text {
                interaction
                    .custom_attributes
                    .insert(ACTION_TEXT_ATTRIBUTE.to_string(), Value::String(text));
            }
        }
        self.start(interaction);
    }

    pub fn url_change(&mut self, timestamp: f64, url: impl Into<String>) {
        let url = url.into();
        self.advance_to(timestamp);
        tracing::trace!(timestamp, url = %url, "URL change");
        self.latest_url = url.clone();

        let debounce = self.config.url_debounce();
        let Some(open) = self.open.as_mut() else {
            return;
        };
        if open.keep_open_until_end_api {
            open.new_url = url;
            return;
        }
        if debounce <= 0.0 {
            self.apply_history(timestamp, url);
            return;
        }

        open.pending_history = Some((timestamp, url));
        self.timers.clear(&mut open.timers.url_debounce);
        open.timers.url_debounce = Some(self.timers.schedule(
            timestamp + debounce,
            TimerKind::UrlDebounce {
                interaction: open.id().to_string(),
            },
        ));
    }

    pub fn dom_mutation(&mut self, timestamp: f64) {
        self.advance_to(timestamp);
        let Some(open) = self.open.as_mut() else {
            return;
        };
        if open.status != InteractionStatus::InProgress
            || open.keep_open_until_end_api
            || timestamp < open.start()
        {
            return;
        }
        open.dom_signal_at = timestamp;
        self.check_completion();
    }

    /// A long task that ran from `start` to `end`. Reported once it is over.
    pub fn long_task(&mut self, start: f64, end: f64) {
        self.advance_to(end);
        let deadline = self.now + self.config.long_task_window();
        let Some(open) = self.open.as_mut() else {
            return;
        };
        if open.status != InteractionStatus::PendingFinish {
            return;
        }

        arm_long_task_watch(&mut self.timers, open, deadline);
        if open.base.end.map_or(true, |current| end > current) {
            open.base.end = Some(end);
        }
        tracing::debug!(id = open.id(), start, end, deadline, "Long task extended interaction");
    }

    /// Start an interaction through the API.
    ///
    /// Without `wait_for_end` an already open interaction is reused. With it,
    /// the new interaction ignores completion signals and the auto-cancel
    /// timer, and only [`end`](Self::end) closes it.
    pub fn start_api_interaction(&mut self, timestamp: f64, wait_for_end: bool) -> String {
        self.advance_to(timestamp);
        if !wait_for_end {
            if let Some(open) = self.open.as_ref() {
                return open.id().to_string();
            }
        }
        self.replace_open();

        let mut interaction = Interaction::new(
            self.ids.next_id(),
            API_TRIGGER,
            timestamp,
            self.initial_page_url.clone(),
            self.latest_url.clone(),
        );
        interaction.old_route = self.latest_route.clone();
        interaction.created_by_api = true;
        interaction.keep_open_until_end_api = wait_for_end;

        let id = interaction.id().to_string();
        self.start(interaction);
        id
    }

    /// Keep the interaction even if it would otherwise be cancelled.
    pub fn save(&mut self, id: &str) -> Result<()> {
        if let Some(interaction) = self.resolve(id)? {
            interaction.force_save = true;
        }
        Ok(())
    }

    /// Drop the interaction when it closes. Wins over [`save`](Self::save).
    pub fn ignore(&mut self, id: &str) -> Result<()> {
        if let Some(interaction) = self.resolve(id)? {
            interaction.force_ignore = true;
        }
        Ok(())
    }

    /// Close the interaction now, at `timestamp` if given.
    pub fn end(&mut self, id: &str, timestamp: Option<f64>) -> Result<()> {
        let end = timestamp.unwrap_or(self.now);
        let interaction = if self.open.as_ref().is_some_and(|open| open.id() == id) {
            self.open.take()
        } else if self
            .initial_page_load
            .as_ref()
            .is_some_and(|ipl| ipl.id() == id)
        {
            self.initial_page_load.take()
        } else {
            return self.closed_or_unknown(id);
        };

        if let Some(mut interaction) = interaction {
            let mut marker = CustomEndNode::new(end);
            marker.base.id = self.ids.next_id();
            interaction.add_child(marker.into());
            self.complete(interaction, Some(end), true);
        }
        Ok(())
    }

    pub fn set_name(&mut self, id: &str, name: impl Into<String>) -> Result<()> {
        if let Some(interaction) = self.resolve(id)? {
            interaction.custom_name = Some(name.into());
        }
        Ok(())
    }

    pub fn set_attribute(&mut self, id: &str, key: impl Into<String>, value: Value) -> Result<()> {
        if let Some(interaction) = self.resolve(id)? {
            interaction.custom_attributes.insert(key.into(), value);
        }
        Ok(())
    }

    /// Name the route the page is on now. The open interaction takes it as
    /// its `new_route`; the next one takes it as its `old_route`.
    pub fn set_current_route_name(&mut self, name: Option<String>) {
        if let Some(open) = self.open.as_mut() {
            open.new_route = name.clone();
        }
        self.latest_route = name;
    }

    /// Register a callback run once, right before the interaction is queued.
    pub fn on_end<F>(&mut self, id: &str, callback: F) -> Result<()>
    where
        F: FnOnce(&mut DoneContext) + Send + 'static,
    {
        self.hooks_for(id)?.on_done(Box::new(callback));
        Ok(())
    }

    pub fn on<F>(&mut self, id: &str, event: InteractionEvent, callback: F) -> Result<()>
    where
        F: FnOnce(&Interaction) + Send + 'static,
    {
        self.hooks_for(id)?.subscribe(event, Box::new(callback));
        Ok(())
    }

    /// [`on`](Self::on) with the event given by name (`finished` or
    /// `cancelled`).
    pub fn on_named<F>(&mut self, id: &str, event: &str, callback: F) -> Result<()>
    where
        F: FnOnce(&Interaction) + Send + 'static,
    {
        let event = event.parse::<InteractionEvent>()?;
        self.on(id, event, callback)
    }

    /// Attach a named span to the interaction active at `start`.
    pub fn create_tracer(&mut self, name: impl Into<String>, start: f64, end: f64) -> Option<String> {
        self.attach_child(start, CustomTracerNode::new(name, start, end).into())
    }

    /// Attribute written onto every interaction that finishes from now on.
    pub fn set_page_attribute(&mut self, key: impl Into<String>, value: Value) {
        self.page_attributes.insert(key.into(), value);
    }

    pub fn remove_page_attribute(&mut self, key: &str) -> Option<Value> {
        self.page_attributes.shift_remove(key)
    }

    /// Finish the initial-page-load interaction with the page's timings.
    pub fn page_loaded(&mut self, load_event_end: f64, timings: PageLoadTimings) {
        self.advance_to(load_event_end);
        let Some(mut interaction) = self.initial_page_load.take() else {
            tracing::trace!("Initial page load already closed");
            return;
        };
        interaction.page_load = Some(timings);
        interaction.force_save = true;
        self.complete(interaction, Some(load_event_end), false);
    }

    /// The interaction an event observed at `timestamp` belongs to.
    pub fn interaction_for(&self, timestamp: f64) -> Option<&Interaction> {
        match self.locate(timestamp)? {
            Slot::Open => self.open.as_ref(),
            Slot::Queued(index) => self.queue.iter_all().nth(index),
            Slot::InitialPageLoad => self.initial_page_load.as_ref(),
        }
    }

    /// Attach `node` to the interaction active at `timestamp`, assigning it
    /// a node id if it has none. Returns the owning interaction's id.
    pub fn attach_child(&mut self, timestamp: f64, mut node: Node) -> Option<String> {
        let slot = self.locate(timestamp)?;
        if node.base().id.is_empty() {
            node.base_mut().id = self.ids.next_id();
        }

        let interaction = match slot {
            Slot::Open => self.open.as_mut(),
            Slot::Queued(index) => self.queue.get_mut(index),
            Slot::InitialPageLoad => self.initial_page_load.as_mut(),
        }?;
        interaction.add_child(node);
        Some(interaction.id().to_string())
    }

    pub fn attach_ajax(&mut self, ajax: AjaxNode) -> Option<String> {
        let start = ajax.base.start;
        self.attach_child(start, ajax.into())
    }

    /// Snapshot the finished interactions and encode them as one payload.
    ///
    /// Returns `None` when nothing is queued. A `Drain` snapshot must be
    /// settled with [`on_harvest_result`](Self::on_harvest_result) before
    /// the next one.
    pub fn prepare_harvest(
        &mut self,
        mode: SnapshotMode,
        obfuscator: &dyn Obfuscator,
    ) -> Result<Option<HarvestPayload>> {
        if mode == SnapshotMode::Drain && self.queue.has_backup() {
            return Err(Error::HarvestInFlight);
        }
        if self.queue.is_empty() {
            return Ok(None);
        }

        let mut batch = self.queue.snapshot_for_harvest(mode)?;
        let pruned: usize = batch.iter_mut().map(Interaction::validate_children).sum();
        if pruned > 0 {
            tracing::debug!(pruned, "Dropped child nodes outside their interaction window");
        }

        let body = serialize_payload(&batch, obfuscator);
        tracing::debug!(
            interactions = batch.len(),
            bytes = body.len(),
            mode = ?mode,
            "Prepared harvest payload"
        );
        Ok(Some(HarvestPayload {
            body,
            interaction_count: batch.len(),
        }))
    }

    pub fn on_harvest_result(&mut self, result: &TransportResult) -> HarvestDisposition {
        self.queue.on_harvest_result(result)
    }

    fn start(&mut self, mut interaction: Interaction) {
        if !interaction.keep_open_until_end_api {
            let deadline = interaction.start() + self.config.cancel_timeout();
            interaction.timers.auto_cancel = Some(self.timers.schedule(
                deadline,
                TimerKind::AutoCancel {
                    interaction: interaction.id().to_string(),
                },
            ));
        }
        tracing::debug!(
            id = interaction.id(),
            trigger = %interaction.trigger,
            start = interaction.start(),
            "Interaction started"
        );
        self.open = Some(interaction);
    }

    fn on_timer(&mut self, kind: TimerKind) {
        let Some(open) = self.open.as_mut() else {
            return;
        };
        match kind {
            TimerKind::AutoCancel { interaction } if interaction == open.id() => {
                open.timers.auto_cancel = None;
                tracing::debug!(id = %interaction, "Interaction timed out");
                self.complete_open();
            }
            TimerKind::LongTaskWatch { interaction } if interaction == open.id() => {
                open.timers.long_task_watch = None;
                self.complete_open();
            }
            TimerKind::UrlDebounce { interaction } if interaction == open.id() => {
                open.timers.url_debounce = None;
                if let Some((timestamp, url)) = open.pending_history.take() {
                    self.apply_history(timestamp, url);
                }
            }
            kind => tracing::trace!(?kind, "Timer for a closed interaction"),
        }
    }

    fn apply_history(&mut self, timestamp: f64, url: String) {
        let Some(open) = self.open.as_mut() else {
            return;
        };
        if open.status == InteractionStatus::InProgress {
            open.history_signal_at = timestamp;
        }
        open.new_url = url;
        self.check_completion();
    }

    fn check_completion(&mut self) {
        let deadline = self.now + self.config.long_task_window();
        let Some(open) = self.open.as_mut() else {
            return;
        };
        if !open.mark_pending_finish() {
            return;
        }

        self.timers.clear(&mut open.timers.auto_cancel);
        arm_long_task_watch(&mut self.timers, open, deadline);
        tracing::debug!(
            id = open.id(),
            end = open.base.end,
            deadline,
            "Interaction pending finish"
        );
    }

    /// Close the open interaction to make room for a new one.
    fn replace_open(&mut self) {
        if let Some(interaction) = self.open.take() {
            tracing::trace!(id = interaction.id(), "Replacing open interaction");
            self.complete(interaction, None, false);
        }
    }

    fn complete_open(&mut self) {
        if let Some(interaction) = self.open.take() {
            self.complete(interaction, None, false);
        }
    }

    /// Decide between finishing and cancelling a closing interaction.
    fn complete(&mut self, mut interaction: Interaction, custom_end: Option<f64>, explicit_end: bool) {
        if let Some((timestamp, url)) = interaction.pending_history.take() {
            if interaction.status == InteractionStatus::InProgress {
                interaction.history_signal_at = timestamp;
                interaction.mark_pending_finish();
            }
            interaction.new_url = url;
        }

        if interaction.force_ignore {
            self.cancel(interaction);
        } else if interaction.status == InteractionStatus::PendingFinish
            || interaction.force_save
            || explicit_end
        {
            self.finish(interaction, custom_end);
        } else {
            self.cancel(interaction);
        }
    }

    fn finish(&mut self, mut interaction: Interaction, custom_end: Option<f64>) {
        self.clear_timers(&mut interaction);
        let status = match interaction.status.transition(StatusEvent::Finish) {
            Ok(status) => status,
            Err(err) => {
                tracing::debug!(id = interaction.id(), %err, "Dropping interaction");
                return;
            }
        };

        let end = [
            interaction.base.end,
            signal_time(interaction.dom_signal_at),
            signal_time(interaction.history_signal_at),
            custom_end,
        ]
        .into_iter()
        .flatten()
        .reduce(f64::max)
        .unwrap_or(self.now);
        interaction.base.end = Some(end.max(interaction.start()));
        interaction.status = status;
        interaction.watch_deadline = None;

        for (key, value) in &self.page_attributes {
            interaction
                .custom_attributes
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }

        let mut hooks = self.hooks.remove(interaction.id()).unwrap_or_default();
        let context = hooks.run_on_done(DoneContext {
            has_replay: self.session.session_mode().has_replay(),
            attributes: Attributes::new(),
        });
        interaction.custom_attributes.extend(context.attributes);
        if context.has_replay {
            interaction
                .custom_attributes
                .insert(HAS_REPLAY_ATTRIBUTE.to_string(), Value::Bool(true));
        }
        hooks.notify(InteractionEvent::Finished, &interaction);

        tracing::debug!(
            id = interaction.id(),
            trigger = %interaction.trigger,
            start = interaction.start(),
            end = interaction.base.end,
            "Interaction finished"
        );
        self.queue.enqueue(interaction);
    }

    fn cancel(&mut self, mut interaction: Interaction) {
        self.clear_timers(&mut interaction);
        match interaction.status.transition(StatusEvent::Cancel) {
            Ok(status) => interaction.status = status,
            Err(err) => {
                tracing::debug!(id = interaction.id(), %err, "Dropping interaction");
                return;
            }
        }
        interaction.watch_deadline = None;
        interaction.base.cancel();

        if let Some(mut hooks) = self.hooks.remove(interaction.id()) {
            hooks.notify(InteractionEvent::Cancelled, &interaction);
        }
        tracing::debug!(
            id = interaction.id(),
            trigger = %interaction.trigger,
            "Interaction cancelled"
        );
    }

    fn clear_timers(&mut self, interaction: &mut Interaction) {
        self.timers.clear(&mut interaction.timers.auto_cancel);
        self.timers.clear(&mut interaction.timers.long_task_watch);
        self.timers.clear(&mut interaction.timers.url_debounce);
    }

    /// The open or initial-page-load interaction with `id`. Ids of
    /// interactions that already closed resolve to `None`.
    fn resolve(&mut self, id: &str) -> Result<Option<&mut Interaction>> {
        if self.open.as_ref().is_some_and(|open| open.id() == id) {
            return Ok(self.open.as_mut());
        }
        if self
            .initial_page_load
            .as_ref()
            .is_some_and(|ipl| ipl.id() == id)
        {
            return Ok(self.initial_page_load.as_mut());
        }
        self.closed_or_unknown(id).map(|()| None)
    }

    fn closed_or_unknown(&self, id: &str) -> Result<()> {
        if self.ids.issued(id) {
            tracing::trace!(id, "Interaction already closed");
            Ok(())
        } else {
            Err(Error::NoInteraction(id.to_string()))
        }
    }

    fn hooks_for(&mut self, id: &str) -> Result<&mut InteractionHooks> {
        if self.resolve(id)?.is_none() {
            return Err(Error::InteractionClosed(id.to_string()));
        }
        Ok(self.hooks.entry(id.to_string()).or_default())
    }

    fn locate(&self, timestamp: f64) -> Option<Slot> {
        if self
            .open
            .as_ref()
            .is_some_and(|open| open.is_active_during(timestamp))
        {
            return Some(Slot::Open);
        }
        // includes a backup still awaiting its transport result
        if let Some((index, _)) = self
            .queue
            .iter_all()
            .enumerate()
            .filter(|(_, interaction)| interaction.contains_event(timestamp))
            .last()
        {
            return Some(Slot::Queued(index));
        }
        self.initial_page_load
            .as_ref()
            .filter(|ipl| ipl.contains_event(timestamp))
            .map(|_| Slot::InitialPageLoad)
    }
}

fn arm_long_task_watch(timers: &mut TimerQueue, interaction: &mut Interaction, deadline: f64) {
    timers.clear(&mut interaction.timers.long_task_watch);
    interaction.timers.long_task_watch = Some(timers.schedule(
        deadline,
        TimerKind::LongTaskWatch {
            interaction: interaction.id().to_string(),
        },
    ));
    interaction.watch_deadline = Some(deadline);
}

/// Completion signal timestamps are 0 until seen.
fn signal_time(at: f64) -> Option<f64> {
    (at > 0.0).then_some(at)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timers_fire_in_deadline_order() {
        let mut controller = InteractionController::new(
            InteractionConfig::default().with_cancel_timeout(1000),
            "https://a.test/",
        );
        controller.ui_event("click", 100.0, None);
        controller.url_change(120.0, "https://a.test/b");
        assert_eq!(controller.next_timer_deadline(), Some(170.0));

        // Debounce (170) fires before auto-cancel (1100) in a single advance.
        controller.advance_to(2000.0);
        assert!(controller.open_interaction().is_none());
        assert_eq!(controller.now(), 2000.0);
        assert!(controller.timers.is_empty());
    }

    #[test]
    fn test_attach_child_assigns_node_ids() {
        let mut controller = InteractionController::new(InteractionConfig::default(), "https://a.test/");
        controller.ui_event("click", 100.0, None);

        controller.attach_child(150.0, CustomTracerNode::new("a", 150.0, 160.0).into());
        let mut named = CustomTracerNode::new("b", 150.0, 160.0);
        named.base.id = "custom".to_string();
        controller.attach_child(155.0, named.into());

        let ids: Vec<&str> = controller
            .open_interaction()
            .map(|open| open.children().iter().map(|node| node.base().id.as_str()).collect())
            .unwrap_or_default();
        assert_eq!(ids, vec!["3", "custom"]);
    }

    #[test]
    fn test_dom_mutation_before_start_ignored() {
        let mut controller = InteractionController::new(InteractionConfig::default(), "https://a.test/");
        controller.ui_event("click", 100.0, None);
        controller.dom_mutation(90.0);
        assert_eq!(controller.open_interaction().map(|open| open.dom_signal_at), Some(0.0));
    }

    #[test]
    fn test_signal_time() {
        assert_eq!(signal_time(0.0), None);
        assert_eq!(signal_time(12.0), Some(12.0));
    }
}
