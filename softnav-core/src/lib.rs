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

//! Softnav Core
//!
//! Soft-navigation interaction capture and the BEL wire format: a timed node
//! tree per user interaction, the lifecycle controller that opens, extends
//! and closes interactions, and the harvest queue that delivers finished
//! interactions with backup and retry.

pub mod bel;
pub mod config;
pub mod controller;
pub mod error;
pub mod harvest;
pub mod ids;
pub mod interaction;
pub mod node;
pub mod session;
pub mod signal;
pub mod timer;

pub use bel::{Attributes, NoopObfuscator, Obfuscator, StringTable, BEL_VERSION};
pub use config::InteractionConfig;
pub use controller::InteractionController;
pub use error::{Error, Result};
pub use harvest::{
    classify, serialize_payload, HarvestDisposition, HarvestPayload, HarvestQueue, SnapshotMode,
    StatusClass, TransportResult,
};
pub use ids::NodeIdGenerator;
pub use interaction::{
    DoneContext, Interaction, InteractionEvent, InteractionStatus, PageLoadTimings,
    RouteChangeType,
};
pub use node::{AjaxNode, CustomEndNode, CustomTracerNode, Node, NodeBase, NodeKind, RequestedWith};
pub use session::{SessionMode, SessionModeSource};
pub use signal::Signal;
pub use timer::{TimerId, TimerKind, TimerQueue};
