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

//! Interaction root nodes
//!
//! An interaction is the root of one soft navigation's node tree. It is
//! plain data: the lifecycle rules that mutate it live in the controller,
//! and callbacks registered against it are kept beside it in
//! [`InteractionHooks`] so that queued copies carry no behaviour.

mod hooks;
mod status;

pub use hooks::{DoneCallback, DoneContext, EventCallback, InteractionEvent, InteractionHooks};
pub use status::{InteractionStatus, InvalidTransition, StatusEvent};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bel::{
    clean_url, encode_attributes, encode_nav_timing, encode_number, encode_nullable, Attributes,
    StringTable,
};
use crate::node::{join_record, serialize_children, Node, NodeBase, NodeKind};
use crate::timer::TimerId;

pub const INITIAL_PAGE_LOAD_TRIGGER: &str = "initialPageLoad";
pub const POPSTATE_TRIGGER: &str = "popstate";
pub const API_TRIGGER: &str = "api";

/// Route change classification written into the interaction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteChangeType {
    InitialPageLoad,
    RouteChange,
    Unspecified,
}

impl RouteChangeType {
    fn encode(self) -> &'static str {
        match self {
            RouteChangeType::InitialPageLoad => "",
            RouteChangeType::RouteChange => "1",
            RouteChangeType::Unspecified => "2",
        }
    }
}

/// Page-load timings only the initial-page-load interaction carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageLoadTimings {
    pub queue_time: Option<f64>,
    pub app_time: Option<f64>,
    pub first_paint: Option<f64>,
    pub first_contentful_paint: Option<f64>,
    /// Navigation timing values relative to the time origin, in the order
    /// the collector expects them.
    pub nav_timing: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct InteractionTimers {
    pub auto_cancel: Option<TimerId>,
    pub long_task_watch: Option<TimerId>,
    pub url_debounce: Option<TimerId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    pub base: NodeBase,
    /// Opaque correlation id, distinct from the node id.
    pub identifier: String,
    pub trigger: String,
    pub initial_page_url: String,
    pub old_url: String,
    pub new_url: String,
    pub custom_name: Option<String>,
    pub custom_attributes: Attributes,
    pub old_route: Option<String>,
    pub new_route: Option<String>,
    pub dom_signal_at: f64,
    pub history_signal_at: f64,
    pub status: InteractionStatus,
    pub created_by_api: bool,
    pub keep_open_until_end_api: bool,
    pub force_save: bool,
    pub force_ignore: bool,
    pub page_load: Option<PageLoadTimings>,
    /// Latest time the interaction may still extend to while pending finish.
    pub(crate) watch_deadline: Option<f64>,
    /// Latest URL change still inside the debounce window.
    pub(crate) pending_history: Option<(f64, String)>,
    pub(crate) timers: InteractionTimers,
}

impl Interaction {
    pub fn new(
        id: impl Into<String>,
        trigger: impl Into<String>,
        start: f64,
        initial_page_url: impl Into<String>,
        current_url: impl Into<String>,
    ) -> Self {
        let current_url = current_url.into();
        Self {
            base: NodeBase {
                id: id.into(),
                ..NodeBase::new(start)
            },
            identifier: Uuid::new_v4().to_string(),
            trigger: trigger.into(),
            initial_page_url: initial_page_url.into(),
            old_url: current_url.clone(),
            new_url: current_url,
            custom_name: None,
            custom_attributes: Attributes::new(),
            old_route: None,
            new_route: None,
            dom_signal_at: 0.0,
            history_signal_at: 0.0,
            status: InteractionStatus::InProgress,
            created_by_api: false,
            keep_open_until_end_api: false,
            force_save: false,
            force_ignore: false,
            page_load: None,
            watch_deadline: None,
            pending_history: None,
            timers: InteractionTimers::default(),
        }
    }

    /// The interaction representing the page's own load.
    pub fn initial_page_load(id: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        let mut interaction = Self::new(id, INITIAL_PAGE_LOAD_TRIGGER, 0.0, url.clone(), url);
        interaction.page_load = Some(PageLoadTimings::default());
        interaction
    }

    pub fn id(&self) -> &str {
        &self.base.id
    }

    pub fn start(&self) -> f64 {
        self.base.start
    }

    pub fn end(&self) -> Option<f64> {
        self.base.end
    }

    pub fn children(&self) -> &[Node] {
        &self.base.children
    }

    pub fn is_initial_page_load(&self) -> bool {
        self.trigger == INITIAL_PAGE_LOAD_TRIGGER
    }

    pub fn add_child(&mut self, node: Node) {
        self.base.add_child(node);
    }

    pub fn contains_event(&self, timestamp: f64) -> bool {
        self.base.contains_event(timestamp)
    }

    /// Like [`Interaction::contains_event`], but a pending interaction also
    /// covers the long-task watch window it may still be extended into.
    pub fn is_active_during(&self, timestamp: f64) -> bool {
        match (self.status, self.watch_deadline) {
            (InteractionStatus::PendingFinish, Some(deadline)) => {
                self.base.start <= timestamp && timestamp <= deadline.max(self.base.end.unwrap_or(deadline))
            }
            _ => self.contains_event(timestamp),
        }
    }

    /// Move to pending finish once both completion signals are in.
    ///
    /// Returns false when a signal is missing, the interaction waits for an
    /// explicit end, or it is no longer in progress.
    pub(crate) fn mark_pending_finish(&mut self) -> bool {
        if self.keep_open_until_end_api || self.dom_signal_at <= 0.0 || self.history_signal_at <= 0.0 {
            return false;
        }
        let Ok(status) = self.status.transition(StatusEvent::CompletionSignals) else {
            return false;
        };
        self.status = status;
        self.base.end = Some(self.dom_signal_at.max(self.history_signal_at));
        true
    }

    pub fn validate_children(&mut self) -> usize {
        self.base.validate_children()
    }

    pub fn route_change_type(&self) -> RouteChangeType {
        if self.is_initial_page_load() {
            RouteChangeType::InitialPageLoad
        } else if self.new_url != self.old_url {
            RouteChangeType::RouteChange
        } else {
            RouteChangeType::Unspecified
        }
    }

    /// Encode this interaction relative to `ancestor_start`.
    ///
    /// String table insertion order is part of the wire contract, so fields
    /// are encoded strictly in record order before attributes and children.
    pub fn serialize(&self, ancestor_start: f64, table: &mut StringTable<'_>) -> String {
        let [rel_start, duration, js_end, js_duration] = self.base.timing_fields(ancestor_start);
        let timings = self.page_load.as_ref();

        let trigger = table.add(&self.trigger);
        let initial_page_url = table.add(clean_url(&self.initial_page_url));
        let old_url = table.add(clean_url(&self.old_url));
        let new_url = table.add(clean_url(&self.new_url));
        let custom_name = table.add_opt(self.custom_name.as_deref());

        let number = |v: f64| encode_number(Some(v));
        let mut routing = encode_nullable(timings.and_then(|t| t.queue_time), number, true);
        routing += &encode_nullable(timings.and_then(|t| t.app_time), number, true);
        routing += &encode_nullable(self.old_route.as_deref(), |s| table.add(s), true);
        routing += &encode_nullable(self.new_route.as_deref(), |s| table.add(s), true);
        routing += &table.add(&self.identifier);

        let node_id = table.add(&self.base.id);
        let paint = encode_nullable(timings.and_then(|t| t.first_paint), number, true)
            + &encode_nullable(timings.and_then(|t| t.first_contentful_paint), number, false);

        let mut attached = encode_attributes(&self.custom_attributes, table);
        attached.extend(serialize_children(&self.base, table));

        let fields = [
            NodeKind::Interaction.type_id().to_string(),
            encode_number(Some(attached.len() as f64)),
            rel_start,
            duration,
            js_end,
            js_duration,
            trigger,
            initial_page_url,
            old_url,
            new_url,
            custom_name,
            self.route_change_type().encode().to_string(),
            routing,
            node_id,
            paint,
        ];

        let mut out = join_record(&fields, &attached);
        if let Some(timings) = timings {
            out.push(';');
            out.push_str(&encode_nav_timing(&timings.nav_timing));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bel::NoopObfuscator;
    use crate::node::AjaxNode;
    use serde_json::json;

    fn finished(start: f64, end: f64) -> Interaction {
        let mut ixn = Interaction::new("2", "click", start, "https://a.test/", "https://a.test/");
        ixn.identifier = "ixn".into();
        ixn.base.end = Some(end);
        ixn.status = InteractionStatus::Finished;
        ixn
    }

    #[test]
    fn test_route_change_type() {
        let mut ixn = finished(0.0, 10.0);
        assert_eq!(ixn.route_change_type(), RouteChangeType::Unspecified);
        ixn.new_url = "https://a.test/cart".into();
        assert_eq!(ixn.route_change_type(), RouteChangeType::RouteChange);
        let ipl = Interaction::initial_page_load("1", "https://a.test/");
        assert_eq!(ipl.route_change_type(), RouteChangeType::InitialPageLoad);
    }

    #[test]
    fn test_serialize_soft_navigation() {
        let mut ixn = finished(100.0, 136.0);
        ixn.new_url = "https://a.test/cart?id=1".into();

        let mut table = StringTable::new(&NoopObfuscator);
        assert_eq!(
            ixn.serialize(0.0, &mut table),
            "1,,2s,10,,,'click,'https://a.test/,1,'https://a.test/cart,,1,!!!!'ixn,'2,!!"
        );
    }

    #[test]
    fn test_serialize_counts_attributes_and_children() {
        let mut ixn = finished(100.0, 400.0);
        ixn.custom_attributes.insert("plan".into(), json!("pro"));
        let mut ajax = AjaxNode::new("GET", 150.0, 200.0);
        ajax.base.id = "3".into();
        ixn.add_child(ajax.into());

        let mut table = StringTable::new(&NoopObfuscator);
        let encoded = ixn.serialize(100.0, &mut table);
        let segments: Vec<&str> = encoded.split(';').collect();
        assert!(segments[0].starts_with("1,2,,8c,"), "{}", segments[0]);
        assert_eq!(segments[1], "5,'plan,'pro");
        assert!(segments[2].starts_with("2,,1e,1e,"), "{}", segments[2]);
        assert_eq!(segments.len(), 3);
    }

    #[test]
    fn test_initial_page_load_trailing_segment() {
        let mut ipl = Interaction::initial_page_load("1", "https://a.test/");
        ipl.identifier = "ipl".into();
        ipl.base.end = Some(1000.0);
        ipl.page_load = Some(PageLoadTimings {
            queue_time: Some(0.0),
            app_time: Some(72.0),
            first_paint: Some(36.0),
            first_contentful_paint: None,
            nav_timing: vec![Some(1.0), Some(37.0)],
        });

        let mut table = StringTable::new(&NoopObfuscator);
        let encoded = ipl.serialize(0.0, &mut table);
        assert!(encoded.contains(",,20,!!'ipl,'1,10,!"), "{}", encoded);
        assert!(encoded.ends_with(";b,1,10"), "{}", encoded);
    }

    #[test]
    fn test_initial_page_load_without_nav_timing_has_empty_segment() {
        let mut ipl = Interaction::initial_page_load("1", "https://a.test/");
        ipl.base.end = Some(10.0);
        let mut table = StringTable::new(&NoopObfuscator);
        assert!(ipl.serialize(0.0, &mut table).ends_with(';'));
    }

    #[test]
    fn test_pending_finish_covers_watch_window() {
        let mut ixn = finished(100.0, 300.0);
        ixn.status = InteractionStatus::PendingFinish;
        ixn.watch_deadline = Some(5300.0);
        assert!(ixn.is_active_during(4000.0));
        assert!(!ixn.is_active_during(5301.0));
        assert!(!ixn.contains_event(4000.0));
    }
}
