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

//! Harvest queue with backup and restore
//!
//! Finished items wait in the live queue until a harvest takes them. A
//! draining snapshot moves the live items into a backup that stays
//! outstanding until the transport reports back:
//!
//! - not sent, or a retry-eligible status: the backup is put back in front
//!   of anything enqueued meanwhile, so the next payload starts with the
//!   same items in the same order
//! - any other outcome: the backup is discarded
//!
//! Only one draining harvest can be outstanding at a time.

mod payload;
mod retry;

pub use payload::{serialize_payload, HarvestPayload};
pub use retry::{classify, StatusClass, TransportResult};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// How a harvest takes items out of the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotMode {
    /// Move the live items into the backup and clear the queue.
    Drain,
    /// Copy the live items and leave the queue untouched. Used for the final
    /// harvest on unload, which is never retried.
    Peek,
}

/// What settling a harvest did to the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestDisposition {
    /// The backup was put back at the front of the queue.
    Restored(usize),
    /// The backup was dropped.
    Discarded(usize),
    /// No backup was outstanding.
    Idle,
}

#[derive(Debug, Clone)]
pub struct HarvestQueue<T> {
    live: Vec<T>,
    backup: Option<Vec<T>>,
}

impl<T> Default for HarvestQueue<T> {
    fn default() -> Self {
        Self {
            live: Vec::new(),
            backup: None,
        }
    }
}

impl<T: Clone> HarvestQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, item: T) {
        self.live.push(item);
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn has_backup(&self) -> bool {
        self.backup.is_some()
    }

    pub fn backup_len(&self) -> usize {
        self.backup.as_ref().map_or(0, Vec::len)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.live.iter()
    }

    /// The outstanding backup followed by the live items.
    pub fn iter_all(&self) -> std::iter::Chain<std::slice::Iter<'_, T>, std::slice::Iter<'_, T>> {
        self.backup
            .as_deref()
            .unwrap_or_default()
            .iter()
            .chain(self.live.iter())
    }

    /// Item at `index` in [`iter_all`](Self::iter_all) order.
    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        let held = self.backup_len();
        match self.backup.as_mut() {
            Some(backup) if index < held => backup.get_mut(index),
            _ => self.live.get_mut(index - held),
        }
    }

    pub fn snapshot_for_harvest(&mut self, mode: SnapshotMode) -> Result<Vec<T>> {
        match mode {
            SnapshotMode::Drain => {
                if self.backup.is_some() {
                    return Err(Error::HarvestInFlight);
                }
                let batch = std::mem::take(&mut self.live);
                self.backup = Some(batch.clone());
                Ok(batch)
            }
            SnapshotMode::Peek => Ok(self.live.clone()),
        }
    }

    /// Put the outstanding backup back in front of the live queue.
    pub fn restore_from_backup(&mut self) -> Result<usize> {
        let mut restored = self.backup.take().ok_or(Error::NoBackup)?;
        let count = restored.len();
        restored.append(&mut self.live);
        self.live = restored;
        Ok(count)
    }

    /// Drop the outstanding backup, returning how many items it held.
    pub fn discard_backup(&mut self) -> Option<usize> {
        self.backup.take().map(|backup| backup.len())
    }

    /// Settle the outstanding draining harvest.
    pub fn on_harvest_result(&mut self, result: &TransportResult) -> HarvestDisposition {
        if !self.has_backup() {
            return HarvestDisposition::Idle;
        }

        if result.should_restore() {
            let count = self.restore_from_backup().unwrap_or(0);
            debug!(
                count,
                sent = result.sent,
                status = ?result.status_code,
                "Restored harvest backup for retry"
            );
            return HarvestDisposition::Restored(count);
        }

        let count = self.discard_backup().unwrap_or(0);
        match result.class() {
            Some(StatusClass::Success) | None => {
                debug!(count, "Harvest delivered");
            }
            Some(StatusClass::Unlisted) => {
                warn!(count, status = ?result.status_code, "Unclassified collector status, dropping payload");
            }
            Some(_) => {
                warn!(count, status = ?result.status_code, "Collector rejected payload, dropping it");
            }
        }
        HarvestDisposition::Discarded(count)
    }
}
