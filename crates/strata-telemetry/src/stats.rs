// Copyright 2025 eraflo
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

//! Lock-free counters describing the renderer's processing cycles.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use strata_core::CommandKind;
use std::time::Duration;

/// Counters updated by the renderer schedule and read from anywhere.
///
/// Share it as an `Arc<RendererStatistics>`.
#[derive(Debug, Default)]
pub struct RendererStatistics {
    cycles: AtomicU64,
    frames_rendered: AtomicU64,
    commands_executed: AtomicU64,
    commands_by_kind: [AtomicU64; CommandKind::ALL.len()],
    events_emitted: AtomicU64,
    failed_requests: AtomicU64,
    largest_drain: AtomicU64,
    longest_cycle_us: AtomicU64,
}

/// A point-in-time copy of [`RendererStatistics`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatisticsSnapshot {
    /// Processing cycles run.
    pub cycles: u64,
    /// Display frames rendered.
    pub frames_rendered: u64,
    /// Commands taken from the transport and applied.
    pub commands_executed: u64,
    /// Applied commands per kind; kinds never seen are left out.
    pub commands_by_kind: BTreeMap<String, u64>,
    /// Events sent back to the producer side.
    pub events_emitted: u64,
    /// Events carrying [`EventResult::Fail`](strata_core::EventResult::Fail).
    pub failed_requests: u64,
    /// Largest number of commands drained in one cycle.
    pub largest_drain: u64,
    /// Longest cycle, in microseconds.
    pub longest_cycle_us: u64,
}

impl RendererStatistics {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one finished processing cycle.
    pub fn record_cycle(&self, drained: usize, duration: Duration) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        self.commands_executed
            .fetch_add(drained as u64, Ordering::Relaxed);
        self.largest_drain
            .fetch_max(drained as u64, Ordering::Relaxed);
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        self.longest_cycle_us.fetch_max(micros, Ordering::Relaxed);
    }

    /// Records one applied command of `kind`.
    pub fn record_command(&self, kind: CommandKind) {
        if let Some(index) = CommandKind::ALL.iter().position(|k| *k == kind) {
            self.commands_by_kind[index].fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Records rendered frames.
    pub fn record_frames(&self, frames: u64) {
        self.frames_rendered.fetch_add(frames, Ordering::Relaxed);
    }

    /// Records emitted events, `failed` of which carried a failure.
    pub fn record_events(&self, emitted: u64, failed: u64) {
        self.events_emitted.fetch_add(emitted, Ordering::Relaxed);
        self.failed_requests.fetch_add(failed, Ordering::Relaxed);
    }

    /// Reads every counter.
    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            frames_rendered: self.frames_rendered.load(Ordering::Relaxed),
            commands_executed: self.commands_executed.load(Ordering::Relaxed),
            commands_by_kind: CommandKind::ALL
                .iter()
                .zip(&self.commands_by_kind)
                .map(|(kind, count)| (kind.to_string(), count.load(Ordering::Relaxed)))
                .filter(|(_, count)| *count > 0)
                .collect(),
            events_emitted: self.events_emitted.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            largest_drain: self.largest_drain.load(Ordering::Relaxed),
            longest_cycle_us: self.longest_cycle_us.load(Ordering::Relaxed),
        }
    }
}

impl StatisticsSnapshot {
    /// Counter deltas since `earlier`; the two maxima are kept as they are.
    pub fn since(&self, earlier: &StatisticsSnapshot) -> StatisticsSnapshot {
        StatisticsSnapshot {
            cycles: self.cycles.saturating_sub(earlier.cycles),
            frames_rendered: self.frames_rendered.saturating_sub(earlier.frames_rendered),
            commands_executed: self
                .commands_executed
                .saturating_sub(earlier.commands_executed),
            commands_by_kind: self
                .commands_by_kind
                .iter()
                .map(|(kind, count)| {
                    let before = earlier.commands_by_kind.get(kind).copied().unwrap_or(0);
                    (kind.clone(), count.saturating_sub(before))
                })
                .filter(|(_, count)| *count > 0)
                .collect(),
            events_emitted: self.events_emitted.saturating_sub(earlier.events_emitted),
            failed_requests: self.failed_requests.saturating_sub(earlier.failed_requests),
            largest_drain: self.largest_drain,
            longest_cycle_us: self.longest_cycle_us,
        }
    }
}
