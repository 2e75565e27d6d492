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

//! Payload assembly for one harvest.

use serde::{Deserialize, Serialize};

use crate::bel::{Obfuscator, StringTable, BEL_VERSION};
use crate::interaction::Interaction;

/// Serialized body ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestPayload {
    pub body: String,
    pub interaction_count: usize,
}

/// Encode a batch of interactions into one `bel.7` payload.
///
/// The first interaction is relative to the time origin; the rest are
/// relative to the first one's start. All records share one string table.
pub fn serialize_payload(interactions: &[Interaction], obfuscator: &dyn Obfuscator) -> String {
    let mut table = StringTable::new(obfuscator);
    let first_start = interactions.first().map(Interaction::start).unwrap_or(0.0);

    let records: Vec<String> = interactions
        .iter()
        .enumerate()
        .map(|(index, interaction)| {
            let ancestor_start = if index == 0 { 0.0 } else { first_start };
            interaction.serialize(ancestor_start, &mut table)
        })
        .collect();

    format!("bel.{};{}", BEL_VERSION, records.join(";"))
}
