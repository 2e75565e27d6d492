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

//! Payload delivery to the collector.

use async_trait::async_trait;
use softnav_core::{HarvestPayload, TransportResult};
use tracing::{debug, warn};

use crate::config::AgentConfig;
use crate::error::TransportError;

/// Sends one payload and reports how the collector answered.
///
/// Implementations never fail: a request that does not complete is
/// reported as [`TransportResult::not_sent`].
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn send(&self, payload: &HarvestPayload) -> TransportResult;
}

/// `reqwest`-backed transport POSTing the BEL body as plain text.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &AgentConfig) -> Result<Self, TransportError> {
        let endpoint = reqwest::Url::parse(&config.endpoint)
            .map_err(|_| TransportError::InvalidEndpoint(config.endpoint.clone()))?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, payload: &HarvestPayload) -> TransportResult {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(payload.body.clone());

        if let Some(api_key) = &self.api_key {
            request = request.header("X-Api-Key", api_key);
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                debug!(
                    status,
                    interactions = payload.interaction_count,
                    "Collector responded"
                );
                TransportResult::from_status(status)
            }
            Err(e) => {
                warn!("Error sending payload to collector: {}", e);
                TransportResult::not_sent()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_endpoint() {
        let config = AgentConfig {
            endpoint: "not a url".to_string(),
            ..AgentConfig::default()
        };
        assert!(matches!(
            HttpTransport::new(&config),
            Err(TransportError::InvalidEndpoint(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_collector_is_not_sent() {
        let config = AgentConfig {
            endpoint: "http://127.0.0.1:9/events/1".to_string(),
            request_timeout_ms: 500,
            ..AgentConfig::default()
        };
        let transport = HttpTransport::new(&config).unwrap();
        let payload = HarvestPayload {
            body: "bel.7;".to_string(),
            interaction_count: 0,
        };
        let result = transport.send(&payload).await;
        assert!(!result.sent);
        assert!(result.should_restore());
    }
}
