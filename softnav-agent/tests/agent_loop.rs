// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Integration tests for the agent event loop

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use softnav_agent::{Agent, AgentConfig, AgentError, HarvestStats, Transport};
use softnav_core::{HarvestPayload, InteractionConfig, Signal, TransportResult};
use tokio_test::assert_ok;

/// Records every payload and answers with scripted statuses (200 once the
/// script runs out).
#[derive(Clone, Default)]
struct ScriptedTransport {
    statuses: Arc<Mutex<VecDeque<u16>>>,
    bodies: Arc<Mutex<Vec<String>>>,
}

impl ScriptedTransport {
    fn answering(statuses: &[u16]) -> Self {
        Self {
            statuses: Arc::new(Mutex::new(statuses.iter().copied().collect())),
            bodies: Arc::default(),
        }
    }

    fn bodies(&self) -> Vec<String> {
        self.bodies.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, payload: &HarvestPayload) -> TransportResult {
        self.bodies.lock().unwrap().push(payload.body.clone());
        let status = self.statuses.lock().unwrap().pop_front().unwrap_or(200);
        TransportResult::from_status(status)
    }
}

/// Timers and harvests only move when the test drives them.
fn manual_config() -> AgentConfig {
    AgentConfig {
        page_url: "https://shop.test/".to_string(),
        harvest_interval_ms: 3_600_000,
        tick_interval_ms: 3_600_000,
        interaction: InteractionConfig::immediate_url_changes(),
        ..AgentConfig::default()
    }
}

async fn finish_click(agent: &Agent, start: f64) {
    agent.signal(Signal::ui_event("click", start)).await.unwrap();
    agent
        .signal(Signal::url_change(start + 10.0, format!("https://shop.test/{start}")))
        .await
        .unwrap();
    agent.signal(Signal::dom_mutation(start + 20.0)).await.unwrap();
    agent
        .call(move |controller| controller.advance_to(start + 6000.0))
        .await
        .unwrap();
}

async fn settled(agent: &Agent) -> HarvestStats {
    for _ in 0..200 {
        let stats = agent.stats().await.unwrap();
        if !stats.in_flight {
            return stats;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("harvest never settled");
}

#[tokio::test]
async fn test_retry_resends_same_payload() {
    let transport = ScriptedTransport::answering(&[429, 200]);
    let agent = Agent::start(manual_config(), transport.clone()).unwrap();

    finish_click(&agent, 1_000.0).await;
    agent.harvest_now().await.unwrap();
    let stats = settled(&agent).await;
    assert_eq!(stats.restored, 1);
    assert_eq!(stats.queued, 1);

    finish_click(&agent, 10_000.0).await;
    agent.harvest_now().await.unwrap();
    let stats = settled(&agent).await;
    assert_eq!(stats.delivered, 2);
    assert_eq!(stats.queued, 0);

    let bodies = transport.bodies();
    assert_eq!(bodies.len(), 2);
    assert!(bodies[1].starts_with(&bodies[0]));

    agent.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_terminal_status_drops_payload() {
    let transport = ScriptedTransport::answering(&[404]);
    let agent = Agent::start(manual_config(), transport.clone()).unwrap();

    finish_click(&agent, 1_000.0).await;
    assert_ok!(agent.harvest_now().await);
    let stats = settled(&agent).await;
    assert_eq!(stats.dropped, 1);
    assert_eq!(stats.last_status, Some(404));

    // Nothing left to send on shutdown.
    let stats = agent.shutdown().await.unwrap();
    assert_eq!(stats.attempts, 1);
    assert_eq!(transport.bodies().len(), 1);
}

#[tokio::test]
async fn test_shutdown_sends_final_payload() {
    let transport = ScriptedTransport::default();
    let agent = Agent::start(manual_config(), transport.clone()).unwrap();

    finish_click(&agent, 1_000.0).await;
    let stats = agent.shutdown().await.unwrap();

    assert_eq!(stats.attempts, 1);
    assert_eq!(stats.delivered, 1);
    let bodies = transport.bodies();
    assert_eq!(bodies.len(), 1);
    assert!(bodies[0].starts_with("bel.7;"));
}

#[tokio::test]
async fn test_controller_calls_run_on_loop() {
    let agent = Agent::start(manual_config(), ScriptedTransport::default()).unwrap();

    let id = agent
        .call(|controller| controller.start_api_interaction(100.0, true))
        .await
        .unwrap();
    let save_id = id.clone();
    let saved = agent
        .call(move |controller| controller.save(&save_id))
        .await
        .unwrap();
    assert_ok!(saved);

    let open = agent
        .call(|controller| controller.open_interaction().map(|i| i.trigger.clone()))
        .await
        .unwrap();
    assert_eq!(open.as_deref(), Some("api"));

    agent.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_periodic_harvest() {
    let transport = ScriptedTransport::default();
    let config = AgentConfig {
        harvest_interval_ms: 20,
        tick_interval_ms: 5,
        ..manual_config()
    };
    let agent = Agent::start(config, transport.clone()).unwrap();

    finish_click(&agent, 1_000.0).await;
    for _ in 0..200 {
        if !transport.bodies().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(transport.bodies().len(), 1);
    let stats = settled(&agent).await;
    assert_eq!(stats.delivered, 1);

    agent.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_invalid_config_rejected() {
    let config = AgentConfig {
        channel_capacity: 0,
        ..manual_config()
    };
    assert!(matches!(
        Agent::start(config, ScriptedTransport::default()),
        Err(AgentError::Config(_))
    ));
}

#[tokio::test]
async fn test_try_call_surfaces_controller_errors() {
    let agent = Agent::start(manual_config(), ScriptedTransport::default()).unwrap();

    let result = agent.try_call(|controller| controller.save("404")).await;
    assert!(matches!(
        result,
        Err(AgentError::Core(softnav_core::Error::NoInteraction(ref id))) if id == "404"
    ));

    let id = agent
        .call(|controller| controller.start_api_interaction(100.0, true))
        .await
        .unwrap();
    assert_ok!(agent.try_call(move |controller| controller.end(&id, Some(150.0))).await);

    agent.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_connect_rejects_bad_endpoint() {
    let config = AgentConfig {
        endpoint: "not a url".to_string(),
        ..manual_config()
    };
    assert!(matches!(
        Agent::connect(config),
        Err(AgentError::Transport(softnav_agent::TransportError::InvalidEndpoint(_)))
    ));
}
