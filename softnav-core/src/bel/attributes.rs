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

//! Typed attribute records.

use serde_json::{Map, Value};

use super::StringTable;

/// Key/value attributes kept in insertion order.
pub type Attributes = Map<String, Value>;

/// Upper bound on attribute records written for one node.
pub const MAX_ATTRIBUTES: usize = 64;

const TYPE_STRING: u8 = 5;
const TYPE_NUMBER: u8 = 6;
const TYPE_TRUE: u8 = 7;
const TYPE_FALSE: u8 = 8;
const TYPE_NULL: u8 = 9;

/// Encode a key/value map into attribute records (`type,key[,value]`).
///
/// Entries past [`MAX_ATTRIBUTES`] are dropped, latest insertions first.
pub fn encode_attributes(attributes: &Attributes, table: &mut StringTable<'_>) -> Vec<String> {
    attributes
        .iter()
        .take(MAX_ATTRIBUTES)
        .map(|(key, value)| {
            // key first: string table order is part of the wire contract
            let key = table.add(key);
            let (type_id, encoded) = match value {
                Value::String(s) => (TYPE_STRING, table.add(s)),
                Value::Number(n) => match n.as_f64() {
                    Some(v) if v.is_finite() => (TYPE_NUMBER, format_attribute_number(v)),
                    _ => (TYPE_NULL, String::new()),
                },
                Value::Bool(true) => (TYPE_TRUE, String::new()),
                Value::Bool(false) => (TYPE_FALSE, String::new()),
                Value::Null => (TYPE_NULL, String::new()),
                Value::Array(_) | Value::Object(_) => match serde_json::to_string(value) {
                    Ok(json) => (TYPE_STRING, table.add(&json)),
                    Err(_) => (TYPE_NULL, String::new()),
                },
            };

            if encoded.is_empty() {
                format!("{},{}", type_id, key)
            } else {
                format!("{},{},{}", type_id, key, encoded)
            }
        })
        .collect()
}

/// Decimal rendering of a numeric attribute.
///
/// Integral values carry a trailing `.` so the collector always reads a
/// floating-point number.
pub fn format_attribute_number(value: f64) -> String {
    if value == 0.0 {
        return "0.".to_string();
    }
    if value.fract() == 0.0 {
        format!("{:.0}.", value)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bel::NoopObfuscator;
    use serde_json::json;

    fn attrs(pairs: &[(&str, Value)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_typed_records() {
        let map = attrs(&[
            ("a", json!("text")),
            ("b", json!(3)),
            ("c", json!(1.5)),
            ("d", json!(true)),
            ("e", json!(false)),
            ("f", Value::Null),
        ]);
        let mut table = StringTable::new(&NoopObfuscator);
        let records = encode_attributes(&map, &mut table);
        assert_eq!(
            records,
            vec!["5,'a,'text", "6,'b,3.", "6,'c,1.5", "7,'d", "8,'e", "9,'f"]
        );
    }

    #[test]
    fn test_objects_are_stringified() {
        let map = attrs(&[("cart", json!({"items": 2}))]);
        let mut table = StringTable::new(&NoopObfuscator);
        let records = encode_attributes(&map, &mut table);
        assert_eq!(records, vec![r#"5,'cart,'{"items":2}"#]);
    }

    #[test]
    fn test_empty_string_value_omits_value_field() {
        let map = attrs(&[("blank", json!(""))]);
        let mut table = StringTable::new(&NoopObfuscator);
        assert_eq!(encode_attributes(&map, &mut table), vec!["5,'blank"]);
    }

    #[test]
    fn test_repeated_values_use_table_index() {
        let map = attrs(&[("x", json!("same")), ("y", json!("same"))]);
        let mut table = StringTable::new(&NoopObfuscator);
        let records = encode_attributes(&map, &mut table);
        assert_eq!(records, vec!["5,'x,'same", "5,'y,1"]);
    }

    #[test]
    fn test_caps_at_max_attributes() {
        let map: Attributes = (0..100)
            .map(|i| (format!("key{:03}", i), json!(i)))
            .collect();
        let mut table = StringTable::new(&NoopObfuscator);
        assert_eq!(encode_attributes(&map, &mut table).len(), MAX_ATTRIBUTES);
    }

    #[test]
    fn test_cap_keeps_earliest_insertions() {
        let mut map: Attributes = (0..MAX_ATTRIBUTES)
            .map(|i| (format!("z{:02}", i), json!(true)))
            .collect();
        map.insert("a_late".to_string(), json!(true));

        let mut table = StringTable::new(&NoopObfuscator);
        let records = encode_attributes(&map, &mut table);
        assert_eq!(records.len(), MAX_ATTRIBUTES);
        assert_eq!(records.first().map(String::as_str), Some("7,'z00"));
        assert!(records.iter().any(|r| r == "7,'z63"));
        assert!(records.iter().all(|r| !r.contains("a_late")));
    }

    #[test]
    fn test_records_follow_insertion_order() {
        let map = attrs(&[("zeta", json!(1)), ("alpha", json!(2))]);
        let mut table = StringTable::new(&NoopObfuscator);
        assert_eq!(encode_attributes(&map, &mut table), vec!["6,'zeta,1.", "6,'alpha,2."]);
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_attribute_number(0.0), "0.");
        assert_eq!(format_attribute_number(-4.0), "-4.");
        assert_eq!(format_attribute_number(2.25), "2.25");
    }
}
