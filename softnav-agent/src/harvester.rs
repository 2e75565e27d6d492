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

//! Agent event loop and harvest cycle
//!
//! One background task owns the [`InteractionController`]. Everything that
//! touches it arrives as a message on that task:
//! - signals and API calls from the [`Agent`] handle
//! - timer sweeps, which advance the controller to the current page time
//! - harvest ticks, which drain the queue into a payload and send it on a
//!   spawned task
//! - transport results, which settle the outstanding harvest
//!
//! At most one harvest is in flight. On shutdown the loop waits for it,
//! then sends whatever is still queued once more, without retry.

use std::sync::Arc;

use serde::Serialize;
use softnav_core::{
    HarvestDisposition, InteractionController, NoopObfuscator, Obfuscator, Signal, SnapshotMode,
    StatusClass, TransportResult,
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, trace, warn};

use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::transport::{HttpTransport, Transport};

type ControllerCall = Box<dyn FnOnce(&mut InteractionController) + Send>;

enum Command {
    Signal(Signal),
    Call(ControllerCall),
    HarvestNow,
    Stats(oneshot::Sender<HarvestStats>),
    Shutdown(oneshot::Sender<HarvestStats>),
}

/// Delivery counters for one agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HarvestStats {
    /// Payloads handed to the transport, including the final one.
    pub attempts: u64,
    /// Interactions the collector accepted.
    pub delivered: u64,
    /// Harvests put back for retry.
    pub restored: u64,
    /// Interactions dropped after a terminal status.
    pub dropped: u64,
    pub last_status: Option<u16>,
    pub in_flight: bool,
    /// Finished interactions waiting for the next harvest.
    pub queued: usize,
}

impl HarvestStats {
    fn record(&mut self, result: &TransportResult, disposition: HarvestDisposition) {
        self.last_status = result.status_code;
        match disposition {
            HarvestDisposition::Restored(_) => self.restored += 1,
            HarvestDisposition::Discarded(count) => {
                if result.class() == Some(StatusClass::Success) {
                    self.delivered += count as u64;
                } else {
                    self.dropped += count as u64;
                }
            }
            HarvestDisposition::Idle => {}
        }
    }
}

/// Page time in milliseconds since the agent started.
#[derive(Debug, Clone, Copy)]
pub struct PageClock {
    origin: Instant,
}

impl PageClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for PageClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a running agent. Dropping it stops the loop after a final
/// harvest.
pub struct Agent {
    sender: mpsc::Sender<Command>,
    clock: PageClock,
    task: JoinHandle<()>,
}

impl Agent {
    /// Spawn the event loop on the current tokio runtime.
    pub fn start(config: AgentConfig, transport: impl Transport) -> Result<Self, AgentError> {
        Self::start_with_obfuscator(config, transport, NoopObfuscator)
    }

    /// Start with the HTTP transport built from `config`.
    pub fn connect(config: AgentConfig) -> Result<Self, AgentError> {
        let transport = HttpTransport::new(&config)?;
        Self::start(config, transport)
    }

    pub fn start_with_obfuscator(
        config: AgentConfig,
        transport: impl Transport,
        obfuscator: impl Obfuscator + Send + 'static,
    ) -> Result<Self, AgentError> {
        config.validate()?;

        let (sender, commands) = mpsc::channel(config.channel_capacity);
        let (result_sender, results) = mpsc::channel(1);
        let clock = PageClock::new();

        let worker = Harvester {
            controller: InteractionController::new(config.interaction.clone(), config.page_url.clone()),
            transport: Arc::new(transport),
            obfuscator: Box::new(obfuscator),
            result_sender,
            in_flight: false,
            stats: HarvestStats::default(),
            clock,
        };
        let task = tokio::spawn(worker.run(config, commands, results));
        debug!("Softnav agent started");

        Ok(Self {
            sender,
            clock,
            task,
        })
    }

    /// Current page time, the clock signal timestamps should use.
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Queue a signal without waiting. Drops it when the buffer is full.
    pub fn record(&self, signal: Signal) -> Result<(), AgentError> {
        match self.sender.try_send(Command::Signal(signal)) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Signal buffer full, dropping signal");
                Err(AgentError::Backpressure)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(AgentError::Stopped),
        }
    }

    /// Queue a signal, waiting for buffer space.
    pub async fn signal(&self, signal: Signal) -> Result<(), AgentError> {
        self.send(Command::Signal(signal)).await
    }

    /// Run `call` against the controller on the event loop and return its
    /// result. Timers due at the current page time fire first.
    pub async fn call<R, F>(&self, call: F) -> Result<R, AgentError>
    where
        F: FnOnce(&mut InteractionController) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply, response) = oneshot::channel();
        self.send(Command::Call(Box::new(move |controller| {
            let _ = reply.send(call(controller));
        })))
        .await?;
        response.await.map_err(|_| AgentError::Stopped)
    }

    /// Like [`call`](Self::call) for controller operations that can fail.
    pub async fn try_call<R, F>(&self, call: F) -> Result<R, AgentError>
    where
        F: FnOnce(&mut InteractionController) -> softnav_core::Result<R> + Send + 'static,
        R: Send + 'static,
    {
        Ok(self.call(call).await??)
    }

    /// Start a harvest now instead of waiting for the next interval.
    pub async fn harvest_now(&self) -> Result<(), AgentError> {
        self.send(Command::HarvestNow).await
    }

    pub async fn stats(&self) -> Result<HarvestStats, AgentError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Stats(reply)).await?;
        response.await.map_err(|_| AgentError::Stopped)
    }

    /// Stop the loop after settling the in-flight harvest and sending the
    /// final one.
    pub async fn shutdown(self) -> Result<HarvestStats, AgentError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Shutdown(reply)).await?;
        let stats = response.await.map_err(|_| AgentError::Stopped)?;
        if let Err(e) = self.task.await {
            error!("Agent task ended abnormally: {}", e);
        }
        Ok(stats)
    }

    async fn send(&self, command: Command) -> Result<(), AgentError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| AgentError::Stopped)
    }
}

struct Harvester {
    controller: InteractionController,
    transport: Arc<dyn Transport>,
    obfuscator: Box<dyn Obfuscator + Send>,
    result_sender: mpsc::Sender<TransportResult>,
    in_flight: bool,
    stats: HarvestStats,
    clock: PageClock,
}

impl Harvester {
    async fn run(
        mut self,
        config: AgentConfig,
        mut commands: mpsc::Receiver<Command>,
        mut results: mpsc::Receiver<TransportResult>,
    ) {
        let mut timer_tick = interval(config.tick_interval());
        timer_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let period = config.harvest_interval();
        let mut harvest_tick = interval_at(Instant::now() + period, period);

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Signal(signal)) => {
                        trace!(?signal, "Signal received");
                        self.controller.handle(signal);
                    }
                    Some(Command::Call(call)) => {
                        self.controller.advance_to(self.clock.now());
                        call(&mut self.controller);
                    }
                    Some(Command::HarvestNow) => self.start_harvest(),
                    Some(Command::Stats(reply)) => {
                        let _ = reply.send(self.snapshot());
                    }
                    Some(Command::Shutdown(reply)) => {
                        self.final_harvest(&mut results).await;
                        let _ = reply.send(self.snapshot());
                        break;
                    }
                    None => {
                        debug!("Agent handle dropped");
                        self.final_harvest(&mut results).await;
                        break;
                    }
                },

                _ = timer_tick.tick() => {
                    self.controller.advance_to(self.clock.now());
                }

                _ = harvest_tick.tick() => self.start_harvest(),

                Some(result) = results.recv() => self.settle(result),
            }
        }

        debug!("Softnav agent stopped");
    }

    fn start_harvest(&mut self) {
        if self.in_flight {
            trace!("Harvest still in flight, skipping cycle");
            return;
        }

        let payload = match self
            .controller
            .prepare_harvest(SnapshotMode::Drain, &*self.obfuscator)
        {
            Ok(Some(payload)) => payload,
            Ok(None) => return,
            Err(e) => {
                warn!("Skipping harvest: {}", e);
                return;
            }
        };

        self.in_flight = true;
        self.stats.attempts += 1;
        let transport = Arc::clone(&self.transport);
        let results = self.result_sender.clone();
        tokio::spawn(async move {
            let result = transport.send(&payload).await;
            // The loop may already be gone on shutdown.
            let _ = results.send(result).await;
        });
    }

    fn settle(&mut self, result: TransportResult) {
        self.in_flight = false;
        let disposition = self.controller.on_harvest_result(&result);
        debug!(?disposition, status = ?result.status_code, "Harvest settled");
        self.stats.record(&result, disposition);
    }

    async fn final_harvest(&mut self, results: &mut mpsc::Receiver<TransportResult>) {
        if self.in_flight {
            if let Some(result) = results.recv().await {
                self.settle(result);
            }
        }
        self.controller.advance_to(self.clock.now());

        let payload = match self
            .controller
            .prepare_harvest(SnapshotMode::Peek, &*self.obfuscator)
        {
            Ok(Some(payload)) => payload,
            Ok(None) => return,
            Err(e) => {
                warn!("Skipping final harvest: {}", e);
                return;
            }
        };

        self.stats.attempts += 1;
        let result = self.transport.send(&payload).await;
        self.stats.last_status = result.status_code;
        if result.class() == Some(StatusClass::Success) {
            self.stats.delivered += payload.interaction_count as u64;
        } else {
            warn!(
                interactions = payload.interaction_count,
                status = ?result.status_code,
                "Final harvest failed, payload dropped"
            );
            self.stats.dropped += payload.interaction_count as u64;
        }
    }

    fn snapshot(&self) -> HarvestStats {
        HarvestStats {
            in_flight: self.in_flight,
            queued: self.controller.queue().len(),
            ..self.stats.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_record() {
        let mut stats = HarvestStats::default();
        stats.record(&TransportResult::from_status(429), HarvestDisposition::Restored(2));
        stats.record(&TransportResult::from_status(202), HarvestDisposition::Discarded(2));
        stats.record(&TransportResult::from_status(404), HarvestDisposition::Discarded(1));

        assert_eq!(stats.restored, 1);
        assert_eq!(stats.delivered, 2);
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.last_status, Some(404));
    }

    #[tokio::test]
    async fn test_page_clock_advances() {
        let clock = PageClock::new();
        let before = clock.now();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        assert!(clock.now() > before);
    }
}
