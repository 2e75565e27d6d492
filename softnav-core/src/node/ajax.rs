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

//! Ajax child nodes.

use serde::{Deserialize, Serialize};

use super::{join_record, serialize_children, NodeBase, NodeKind};
use crate::bel::{
    encode_attributes, encode_number, encode_number_always, encode_nullable, Attributes, StringTable,
};

/// Which API issued the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestedWith {
    #[default]
    Xhr,
    Fetch,
    Jsonp,
}

impl RequestedWith {
    /// XHR is the default and is elided; JSONP writes an explicit zero.
    fn encode(self) -> String {
        match self {
            RequestedWith::Xhr => String::new(),
            RequestedWith::Fetch => encode_number_always(1.0),
            RequestedWith::Jsonp => encode_number_always(0.0),
        }
    }
}

/// A completed network request attributed to an interaction.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AjaxNode {
    pub base: NodeBase,
    pub method: String,
    pub status: u16,
    pub domain: String,
    pub path: String,
    pub tx_size: u64,
    pub rx_size: u64,
    pub requested_with: RequestedWith,
    pub span_id: Option<String>,
    pub trace_id: Option<String>,
    pub span_timestamp: Option<f64>,
    /// Structured-query (GraphQL) metadata, written as attribute records.
    pub gql: Option<Attributes>,
}

impl AjaxNode {
    pub fn new(method: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            base: NodeBase {
                start,
                end: Some(end),
                ..NodeBase::default()
            },
            method: method.into(),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_url(mut self, domain: impl Into<String>, path: impl Into<String>) -> Self {
        self.domain = domain.into();
        self.path = path.into();
        self
    }

    pub fn with_sizes(mut self, tx_size: u64, rx_size: u64) -> Self {
        self.tx_size = tx_size;
        self.rx_size = rx_size;
        self
    }

    pub fn with_requested_with(mut self, requested_with: RequestedWith) -> Self {
        self.requested_with = requested_with;
        self
    }

    pub fn with_trace(
        mut self,
        span_id: impl Into<String>,
        trace_id: impl Into<String>,
        span_timestamp: f64,
    ) -> Self {
        self.span_id = Some(span_id.into());
        self.trace_id = Some(trace_id.into());
        self.span_timestamp = Some(span_timestamp);
        self
    }

    pub fn with_gql(mut self, gql: Attributes) -> Self {
        self.gql = Some(gql);
        self
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::Ajax
    }

    pub fn serialize(&self, ancestor_start: f64, table: &mut StringTable<'_>) -> String {
        let [rel_start, duration, js_end, js_duration] = self.base.timing_fields(ancestor_start);
        let method = table.add(&self.method);
        let status = encode_number(Some(self.status as f64));
        let domain = table.add(&self.domain);
        let path = table.add(&self.path);
        let node_id = table.add(&self.base.id);
        let tracing = encode_nullable(self.span_id.as_deref(), |s| table.add(s), true)
            + &encode_nullable(self.trace_id.as_deref(), |s| table.add(s), true)
            + &encode_nullable(self.span_timestamp, |t| encode_number(Some(t)), false);

        let mut attached = match &self.gql {
            Some(gql) => encode_attributes(gql, table),
            None => Vec::new(),
        };
        attached.extend(serialize_children(&self.base, table));

        let fields = [
            NodeKind::Ajax.type_id().to_string(),
            encode_number(Some(attached.len() as f64)),
            rel_start,
            duration,
            js_end,
            js_duration,
            method,
            status,
            domain,
            path,
            encode_number(Some(self.tx_size as f64)),
            encode_number(Some(self.rx_size as f64)),
            self.requested_with.encode(),
            node_id,
            tracing,
        ];
        join_record(&fields, &attached)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bel::NoopObfuscator;
    use serde_json::json;

    #[test]
    fn test_serialize_plain_xhr() {
        let mut node = AjaxNode::new("GET", 150.0, 250.0)
            .with_status(200)
            .with_url("api.test:443", "/items")
            .with_sizes(0, 512);
        node.base.id = "7".into();

        let mut table = StringTable::new(&NoopObfuscator);
        assert_eq!(
            node.serialize(100.0, &mut table),
            "2,,1e,2s,,,'GET,5k,'api.test:443,'/items,,e8,,'7,!!!"
        );
    }

    #[test]
    fn test_serialize_fetch_with_trace() {
        let mut node = AjaxNode::new("POST", 100.0, 100.0)
            .with_requested_with(RequestedWith::Fetch)
            .with_trace("span1", "trace1", 36.0);
        node.base.id = "1".into();

        let mut table = StringTable::new(&NoopObfuscator);
        let encoded = node.serialize(100.0, &mut table);
        assert!(encoded.ends_with(",1,'1,'span1,'trace1,10"), "{}", encoded);
    }

    #[test]
    fn test_jsonp_writes_explicit_zero() {
        assert_eq!(RequestedWith::Jsonp.encode(), "0");
        assert_eq!(RequestedWith::Xhr.encode(), "");
    }

    #[test]
    fn test_gql_attributes_follow_record() {
        let mut gql = Attributes::new();
        gql.insert("operationName".to_string(), json!("GetCart"));
        let mut node = AjaxNode::new("POST", 0.0, 10.0).with_gql(gql);
        node.base.id = "3".into();

        let mut table = StringTable::new(&NoopObfuscator);
        let encoded = node.serialize(0.0, &mut table);
        let mut segments = encoded.split(';');
        let record = segments.next().unwrap();
        assert!(record.starts_with("2,1,"), "{}", record);
        assert_eq!(segments.next(), Some("5,'operationName,'GetCart"));
    }
}
