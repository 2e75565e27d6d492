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

//! BEL wire codec
//!
//! The "browser event list" format is a compact, delimited text encoding:
//! records are separated by `;`, fields by `,`, numbers are base-36 and an
//! absent value is written as the self-delimiting sentinel `!`.
//!
//! Nothing in this module fails. Non-finite numbers encode as absent and
//! attribute values that cannot be stringified degrade to the null type,
//! so one bad node never blocks a whole harvest.

mod attributes;
mod string_table;

pub use attributes::{encode_attributes, Attributes, format_attribute_number, MAX_ATTRIBUTES};
pub use string_table::{NoopObfuscator, Obfuscator, StringTable};

/// Version prefix written at the head of every payload.
pub const BEL_VERSION: u32 = 7;

/// Sentinel for an explicitly absent field.
pub const NULL_SENTINEL: &str = "!";

/// Maximum number of navigation timing entries in the `b` segment.
pub const NAV_TIMING_ENTRIES: usize = 20;

/// Base-36 rendering of a signed integer.
pub fn to_base36(value: i64) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let negative = value < 0;
    let mut magnitude = value.unsigned_abs();
    let mut digits = Vec::new();
    while magnitude > 0 {
        let digit = (magnitude % 36) as u32;
        digits.push(std::char::from_digit(digit, 36).unwrap_or('0'));
        magnitude /= 36;
    }
    if negative {
        digits.push('-');
    }
    digits.iter().rev().collect()
}

/// Encode the floor of `n` in base-36.
///
/// `None` and exactly `0` collapse to the empty string.
pub fn encode_number(n: Option<f64>) -> String {
    match n {
        Some(v) if v.is_finite() && v != 0.0 => to_base36(v.floor() as i64),
        _ => String::new(),
    }
}

/// Encode the floor of `n` in base-36 without eliding zero.
pub fn encode_number_always(n: f64) -> String {
    if n.is_finite() {
        to_base36(n.floor() as i64)
    } else {
        String::new()
    }
}

/// Encode an optional field.
///
/// A present value (including `0` and `""`) is passed through `encode`,
/// optionally followed by `,` so several nullable fields can be chained.
/// An absent value becomes `!`, which needs no separator after it.
pub fn encode_nullable<T, F>(value: Option<T>, encode: F, with_trailing_separator: bool) -> String
where
    F: FnOnce(T) -> String,
{
    match value {
        Some(v) => {
            let mut out = encode(v);
            if with_trailing_separator {
                out.push(',');
            }
            out
        }
        None => NULL_SENTINEL.to_string(),
    }
}

/// Strip query string and fragment from a URL.
pub fn clean_url(url: &str) -> &str {
    let cut = url.find(['?', '#']).unwrap_or(url.len());
    &url[..cut]
}

/// Encode the navigation timing segment of the initial page load.
///
/// Each present value is written as the delta from the previous present
/// value. Absent entries become `!`, which swallows the following comma.
/// Returns an empty string when there is no timing data at all.
pub fn encode_nav_timing(values: &[Option<f64>]) -> String {
    if values.is_empty() {
        return String::new();
    }

    let mut out = String::from("b");
    let mut separator = ",";
    let mut previous = 0.0;
    for value in values.iter().take(NAV_TIMING_ENTRIES) {
        out.push_str(separator);
        match value {
            Some(v) if v.is_finite() => {
                out.push_str(&encode_number(Some(v - previous)));
                previous = *v;
                separator = ",";
            }
            _ => {
                out.push_str(NULL_SENTINEL);
                separator = "";
            }
        }
    }
    out
}
