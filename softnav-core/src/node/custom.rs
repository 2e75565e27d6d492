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

//! API-created nodes: explicit end markers and custom tracers.

use serde::{Deserialize, Serialize};

use super::{join_record, serialize_children, NodeBase, NodeKind};
use crate::bel::{encode_number, StringTable};

/// Marks the moment an interaction was ended through the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomEndNode {
    pub base: NodeBase,
}

impl CustomEndNode {
    pub fn new(end: f64) -> Self {
        Self {
            base: NodeBase {
                start: end,
                end: Some(end),
                ..NodeBase::default()
            },
        }
    }

    pub fn end(&self) -> f64 {
        self.base.end.unwrap_or(self.base.start)
    }

    /// Two-field record: type id and end relative to the parent.
    pub fn serialize(&self, ancestor_start: f64) -> String {
        format!(
            "{},{}",
            NodeKind::CustomEnd.type_id(),
            encode_number(Some(self.end() - ancestor_start))
        )
    }
}

/// A named span of work inside an interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomTracerNode {
    pub base: NodeBase,
    pub name: String,
}

impl CustomTracerNode {
    pub fn new(name: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            base: NodeBase {
                start,
                end: Some(end),
                ..NodeBase::default()
            },
            name: name.into(),
        }
    }

    pub fn serialize(&self, ancestor_start: f64, table: &mut StringTable<'_>) -> String {
        let [rel_start, duration, js_end, js_duration] = self.base.timing_fields(ancestor_start);
        let name = table.add(&self.name);
        let children = serialize_children(&self.base, table);
        let fields = [
            NodeKind::CustomTracer.type_id().to_string(),
            encode_number(Some(children.len() as f64)),
            rel_start,
            duration,
            js_end,
            js_duration,
            name,
        ];
        join_record(&fields, &children)
    }
}
