//! Historical device-stats series.
//!
//! Two sources produce the same ordered `StatsSnapshot` series:
//! [`HistoryWindow`], a bounded ring buffer of real aggregation passes, and
//! [`simulate_history`], an approximate hourly series derived from the current
//! stats for when no real history has been recorded yet.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use shared::ratio::round_half_up;

use crate::models::{DeviceStats, FleetAggregate, StatsSnapshot};

/// Lower bound of the simulated variance factor.
const VARIANCE_MIN: f64 = 0.9;

/// Upper bound (exclusive) of the simulated variance factor.
const VARIANCE_MAX: f64 = 1.1;

/// Builds `hours + 1` hourly snapshots ending at `now`, oldest first.
///
/// Each bucket scales the active, idle and offline counts of `current` by an
/// independent factor in `[0.9, 1.1)`. The series is an approximation; it does
/// not keep `active + idle + offline == total`.
pub fn simulate_history<R: Rng>(
    current: &DeviceStats,
    hours: u32,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<StatsSnapshot> {
    (0..=hours)
        .rev()
        .map(|hours_back| {
            let mut device_stats = current.clone();
            device_stats.active = perturb(current.active, rng);
            device_stats.idle = perturb(current.idle, rng);
            device_stats.offline = perturb(current.offline, rng);
            StatsSnapshot {
                timestamp: now - Duration::hours(i64::from(hours_back)),
                device_stats,
            }
        })
        .collect()
}

fn perturb<R: Rng>(count: u64, rng: &mut R) -> u64 {
    let factor = rng.gen_range(VARIANCE_MIN..VARIANCE_MAX);
    round_half_up(count as f64 * factor) as u64
}

/// Rolling window of the most recent aggregation passes.
#[derive(Debug, Clone)]
pub struct HistoryWindow {
    capacity: usize,
    entries: VecDeque<FleetAggregate>,
}

impl HistoryWindow {
    /// Creates an empty window holding at most `capacity` passes (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Records a pass, evicting the oldest when full.
    pub fn record(&mut self, aggregate: FleetAggregate) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(aggregate);
    }

    pub fn latest(&self) -> Option<&FleetAggregate> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshots no older than `hours` before `now`, oldest first.
    ///
    /// The latest pass is always included, so `hours == 0` still yields the
    /// current state once anything has been recorded.
    pub fn snapshots_since(&self, hours: u32, now: DateTime<Utc>) -> Vec<StatsSnapshot> {
        let cutoff = now - Duration::hours(i64::from(hours));
        let cutoff = self
            .latest()
            .map_or(cutoff, |latest| cutoff.min(latest.timestamp));
        self.entries
            .iter()
            .filter(|entry| entry.timestamp >= cutoff)
            .map(FleetAggregate::snapshot)
            .collect()
    }
}
