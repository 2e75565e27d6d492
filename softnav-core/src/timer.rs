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

//! Deterministic timer queue.
//!
//! Timers are plain data: scheduling returns a key, cancelling removes the
//! entry, and the owner drains expired entries with [`TimerQueue::pop_due`]
//! as its clock advances. Nothing fires on its own, so the controller handles
//! timer expiry through the same transition functions as external signals.

/// Key returned by [`TimerQueue::schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// What a timer does when it fires. Each variant names the interaction
/// (by node id) it was armed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerKind {
    AutoCancel { interaction: String },
    LongTaskWatch { interaction: String },
    UrlDebounce { interaction: String },
}

#[derive(Debug, Clone)]
struct ScheduledTimer {
    id: TimerId,
    deadline: f64,
    kind: TimerKind,
}

/// An expired timer handed back to the owner.
#[derive(Debug, Clone, PartialEq)]
pub struct FiredTimer {
    pub id: TimerId,
    pub deadline: f64,
    pub kind: TimerKind,
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    pending: Vec<ScheduledTimer>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, deadline: f64, kind: TimerKind) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(ScheduledTimer { id, deadline, kind });
        id
    }

    /// Cancel a timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|timer| timer.id != id);
        self.pending.len() != before
    }

    /// Cancel the timer held in `slot`, leaving the slot empty.
    pub fn clear(&mut self, slot: &mut Option<TimerId>) {
        if let Some(id) = slot.take() {
            self.cancel(id);
        }
    }

    pub fn deadline(&self, id: TimerId) -> Option<f64> {
        self.pending
            .iter()
            .find(|timer| timer.id == id)
            .map(|timer| timer.deadline)
    }

    pub fn next_deadline(&self) -> Option<f64> {
        self.pending
            .iter()
            .map(|timer| timer.deadline)
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Remove and return the earliest timer with `deadline <= now`.
    ///
    /// Timers sharing a deadline fire in scheduling order.
    pub fn pop_due(&mut self, now: f64) -> Option<FiredTimer> {
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.deadline <= now)
            .min_by(|(_, a), (_, b)| a.deadline.total_cmp(&b.deadline).then(a.id.cmp(&b.id)))
            .map(|(index, _)| index)?;

        let timer = self.pending.remove(index);
        Some(FiredTimer {
            id: timer.id,
            deadline: timer.deadline,
            kind: timer.kind,
        })
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
