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

//! Periodic statistics reporting.

use crate::stats::{RendererStatistics, StatisticsSnapshot};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Logs a summary of [`RendererStatistics`] at a fixed interval.
#[derive(Debug)]
pub struct StatisticsReporter {
    stats: Arc<RendererStatistics>,
    last_report: Instant,
    last_snapshot: StatisticsSnapshot,
    interval: Duration,
}

impl StatisticsReporter {
    /// Creates a reporter for `stats` logging every `interval`.
    pub fn new(stats: Arc<RendererStatistics>, interval: Duration) -> Self {
        Self {
            stats,
            last_report: Instant::now(),
            last_snapshot: StatisticsSnapshot::default(),
            interval,
        }
    }

    /// Should be called periodically (e.g., once per frame).
    ///
    /// ## Returns
    /// The counters accumulated since the previous report, if a report was due.
    pub fn tick(&mut self) -> Option<StatisticsSnapshot> {
        if self.last_report.elapsed() < self.interval {
            return None;
        }
        let current = self.stats.snapshot();
        let delta = current.since(&self.last_snapshot);
        match serde_json::to_string(&delta) {
            Ok(json) => log::info!("Renderer statistics: {json}"),
            Err(e) => log::warn!("Could not serialize renderer statistics: {e}"),
        }
        self.last_snapshot = current;
        self.last_report = Instant::now();
        Some(delta)
    }

    /// The statistics being reported.
    pub fn statistics(&self) -> &Arc<RendererStatistics> {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_only_when_due() {
        let stats = Arc::new(RendererStatistics::new());
        let mut reporter = StatisticsReporter::new(Arc::clone(&stats), Duration::from_secs(3600));
        stats.record_cycle(1, Duration::ZERO);
        assert!(reporter.tick().is_none());
    }

    #[test]
    fn test_zero_interval_reports_deltas() {
        let stats = Arc::new(RendererStatistics::new());
        let mut reporter = StatisticsReporter::new(Arc::clone(&stats), Duration::ZERO);
        stats.record_cycle(3, Duration::ZERO);
        assert_eq!(reporter.tick().map(|d| d.commands_executed), Some(3));
        stats.record_cycle(1, Duration::ZERO);
        assert_eq!(reporter.tick().map(|d| d.commands_executed), Some(1));
    }
}
