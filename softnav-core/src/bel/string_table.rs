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

//! Per-payload string dedup table.

use std::borrow::Cow;
use std::collections::HashMap;

use super::to_base36;

/// String transform applied before a value enters the string table.
pub trait Obfuscator {
    fn obfuscate<'a>(&self, value: &'a str) -> Cow<'a, str>;
}

/// Leaves every string untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObfuscator;

impl Obfuscator for NoopObfuscator {
    fn obfuscate<'a>(&self, value: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(value)
    }
}

impl<F> Obfuscator for F
where
    F: Fn(&str) -> String,
{
    fn obfuscate<'a>(&self, value: &'a str) -> Cow<'a, str> {
        Cow::Owned(self(value))
    }
}

/// Dedup table scoped to one serialization pass.
///
/// The first occurrence of a string is written as a `'`-prefixed literal with
/// the delimiters `,` `;` `\` backslash-escaped; every later occurrence is
/// written as its base-36 table index.
pub struct StringTable<'o> {
    obfuscator: &'o dyn Obfuscator,
    indices: HashMap<String, usize>,
}

impl<'o> StringTable<'o> {
    pub fn new(obfuscator: &'o dyn Obfuscator) -> Self {
        Self {
            obfuscator,
            indices: HashMap::new(),
        }
    }

    /// Add a string, returning its encoded form.
    ///
    /// Empty input, or input the obfuscator empties, encodes to the empty
    /// string and takes no slot.
    pub fn add(&mut self, value: &str) -> String {
        if value.is_empty() {
            return String::new();
        }

        let value = self.obfuscator.obfuscate(value);
        if value.is_empty() {
            return String::new();
        }
        if let Some(index) = self.indices.get(value.as_ref()) {
            return to_base36(*index as i64);
        }

        let index = self.indices.len();
        let quoted = quote(&value);
        self.indices.insert(value.into_owned(), index);
        quoted
    }

    pub fn add_opt(&mut self, value: Option<&str>) -> String {
        value.map(|v| self.add(v)).unwrap_or_default()
    }

    /// Number of distinct strings recorded so far.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 1);
    out.push('\'');
    for c in value.chars() {
        if matches!(c, ',' | ';' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_emits_literal_then_index() {
        let mut table = StringTable::new(&NoopObfuscator);
        assert_eq!(table.add("click"), "'click");
        assert_eq!(table.add("GET"), "'GET");
        assert_eq!(table.add("click"), "0");
        assert_eq!(table.add("GET"), "1");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_empty_takes_no_slot() {
        let mut table = StringTable::new(&NoopObfuscator);
        assert_eq!(table.add(""), "");
        assert_eq!(table.add_opt(None), "");
        assert!(table.is_empty());
        assert_eq!(table.add("a"), "'a");
        assert_eq!(table.add("a"), "0");
    }

    #[test]
    fn test_escapes_delimiters() {
        let mut table = StringTable::new(&NoopObfuscator);
        assert_eq!(table.add(r"a,b;c\d"), r"'a\,b\;c\\d");
    }

    #[test]
    fn test_obfuscation_applies_before_dedup() {
        let redact = |s: &str| s.replace("secret", "***");
        let mut table = StringTable::new(&redact);
        assert_eq!(table.add("/user/secret"), "'/user/***");
        // a different raw value that obfuscates to the same string shares the slot
        assert_eq!(table.add("/user/***"), "0");
    }

    #[test]
    fn test_obfuscated_to_empty_takes_no_slot() {
        let drop_tokens = |s: &str| if s.starts_with("token=") { String::new() } else { s.to_string() };
        let mut table = StringTable::new(&drop_tokens);
        assert_eq!(table.add("token=abc"), "");
        assert!(table.is_empty());
        assert_eq!(table.add("kept"), "'kept");
        assert_eq!(table.add("kept"), "0");
    }
}
