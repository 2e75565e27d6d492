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

//! Timed node tree
//!
//! Every node carries a start/end window in milliseconds relative to the
//! page's time origin and owns an ordered list of children. Insertion order
//! is serialization order.
//!
//! The containment invariant (`child.start >= parent.start`, and
//! `child.end <= parent.end` once the parent is closed) is not enforced when
//! a child is attached. Signals arrive out of order, so violating children
//! are pruned by [`NodeBase::validate_children`] right before serialization.

mod ajax;
mod custom;

pub use ajax::{AjaxNode, RequestedWith};
pub use custom::{CustomEndNode, CustomTracerNode};

use serde::{Deserialize, Serialize};

use crate::bel::{encode_number, StringTable};

/// Wire type id of each node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Interaction,
    Ajax,
    CustomEnd,
    CustomTracer,
}

impl NodeKind {
    pub fn type_id(self) -> u8 {
        match self {
            NodeKind::Interaction => 1,
            NodeKind::Ajax => 2,
            NodeKind::CustomEnd => 3,
            NodeKind::CustomTracer => 4,
        }
    }
}

/// Fields shared by every node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeBase {
    pub id: String,
    pub start: f64,
    pub end: Option<f64>,
    /// Time spent in async callback work, relative to `start`.
    pub callback_end: f64,
    pub callback_duration: f64,
    pub children: Vec<Node>,
    pub cancelled: bool,
}

impl NodeBase {
    pub fn new(start: f64) -> Self {
        Self {
            start,
            ..Self::default()
        }
    }

    pub fn add_child(&mut self, node: Node) {
        self.children.push(node);
    }

    /// Whether `timestamp` falls inside this node's window.
    pub fn contains_event(&self, timestamp: f64) -> bool {
        self.start <= timestamp && self.end.map_or(true, |end| timestamp <= end)
    }

    /// Whether a child with this window satisfies containment under `self`.
    pub fn admits(&self, child: &NodeBase) -> bool {
        if child.start < self.start {
            return false;
        }
        match (self.end, child.end) {
            (None, _) => true,
            (Some(parent_end), Some(child_end)) => child_end <= parent_end,
            (Some(_), None) => false,
        }
    }

    /// Drop children violating containment, recursively.
    ///
    /// Returns how many nodes were pruned across the whole subtree.
    pub fn validate_children(&mut self) -> usize {
        let before = self.children.len();
        let window = NodeBase {
            start: self.start,
            end: self.end,
            ..NodeBase::default()
        };
        self.children.retain(|child| window.admits(child.base()));
        let mut pruned = before - self.children.len();
        for child in &mut self.children {
            pruned += child.base_mut().validate_children();
        }
        pruned
    }

    /// Mark this node and its whole subtree cancelled.
    pub fn cancel(&mut self) {
        self.cancelled = true;
        for child in &mut self.children {
            child.base_mut().cancel();
        }
    }

    pub(crate) fn duration(&self) -> f64 {
        self.end.map_or(0.0, |end| end - self.start)
    }

    /// The four timing fields every structural record starts with.
    pub(crate) fn timing_fields(&self, ancestor_start: f64) -> [String; 4] {
        [
            encode_number(Some(self.start - ancestor_start)),
            encode_number(Some(self.duration())),
            encode_number(Some(self.callback_end)),
            encode_number(Some(self.callback_duration)),
        ]
    }
}

/// A child node of an interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Ajax(AjaxNode),
    CustomEnd(CustomEndNode),
    CustomTracer(CustomTracerNode),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Ajax(_) => NodeKind::Ajax,
            Node::CustomEnd(_) => NodeKind::CustomEnd,
            Node::CustomTracer(_) => NodeKind::CustomTracer,
        }
    }

    pub fn base(&self) -> &NodeBase {
        match self {
            Node::Ajax(node) => &node.base,
            Node::CustomEnd(node) => &node.base,
            Node::CustomTracer(node) => &node.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut NodeBase {
        match self {
            Node::Ajax(node) => &mut node.base,
            Node::CustomEnd(node) => &mut node.base,
            Node::CustomTracer(node) => &mut node.base,
        }
    }

    pub fn contains_event(&self, timestamp: f64) -> bool {
        self.base().contains_event(timestamp)
    }

    /// Encode this node relative to its parent's start.
    pub fn serialize(&self, ancestor_start: f64, table: &mut StringTable<'_>) -> String {
        match self {
            Node::Ajax(node) => node.serialize(ancestor_start, table),
            Node::CustomEnd(node) => node.serialize(ancestor_start),
            Node::CustomTracer(node) => node.serialize(ancestor_start, table),
        }
    }
}

impl From<AjaxNode> for Node {
    fn from(node: AjaxNode) -> Self {
        Node::Ajax(node)
    }
}

impl From<CustomEndNode> for Node {
    fn from(node: CustomEndNode) -> Self {
        Node::CustomEnd(node)
    }
}

impl From<CustomTracerNode> for Node {
    fn from(node: CustomTracerNode) -> Self {
        Node::CustomTracer(node)
    }
}

/// Join a record's fields, then append its child block when it has one.
pub(crate) fn join_record(fields: &[String], children: &[String]) -> String {
    let mut out = fields.join(",");
    if !children.is_empty() {
        out.push(';');
        out.push_str(&children.join(";"));
    }
    out
}

/// Serialize the structural children of a node relative to its start.
pub(crate) fn serialize_children(base: &NodeBase, table: &mut StringTable<'_>) -> Vec<String> {
    base.children
        .iter()
        .filter(|child| !child.base().cancelled)
        .map(|child| child.serialize(base.start, table))
        .collect()
}
