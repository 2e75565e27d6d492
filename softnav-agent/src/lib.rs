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

//! Softnav Agent
//!
//! Async host for the softnav controller: feeds it signals, sweeps its
//! timers, runs the harvest cycle and delivers payloads over HTTP.
//!
//! ```no_run
//! use softnav_agent::{Agent, AgentConfig};
//! use softnav_core::Signal;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = AgentConfig::from_env();
//! softnav_agent::init_logging(&config.log_filter)?;
//!
//! let agent = Agent::connect(config)?;
//! agent.record(Signal::ui_event("click", agent.now()))?;
//! let id = agent.call(|c| c.start_api_interaction(c.now(), true)).await?;
//! agent.try_call(move |c| c.end(&id, None)).await?;
//! agent.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod harvester;
pub mod telemetry;
pub mod transport;

pub use config::AgentConfig;
pub use error::{AgentError, TransportError};
pub use harvester::{Agent, HarvestStats, PageClock};
pub use telemetry::init_logging;
pub use transport::{HttpTransport, Transport};
