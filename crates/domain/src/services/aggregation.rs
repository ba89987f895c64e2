//! Fleet aggregation engine.
//!
//! Pure functions over the current device, position and fuel request
//! collections. Nothing here keeps state between calls, so a pass can run
//! concurrently with another pass on the same inputs.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use shared::ratio::{percentage, round_half_up, safe_div};

use crate::models::{
    AlertStats, Device, DeviceStats, DeviceStatus, EfficiencyMetrics, FleetAggregate,
    FuelRequest, FuelRequestStatus, FuelStats, FuelUrgency, Position,
};

/// Fuel level (percent) below which a device raises a low-fuel warning.
pub const LOW_FUEL_THRESHOLD: f64 = 20.0;

/// Service interval of the odometer, in raw server units.
pub const MAINTENANCE_INTERVAL: f64 = 10_000.0;

/// A device is due for maintenance while its odometer is this close past an interval mark.
pub const MAINTENANCE_WINDOW: f64 = 500.0;

/// Raw distance units per kilometer.
const UNITS_PER_KM: f64 = 1000.0;

/// Per-pass operating state of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceState {
    Moving,
    Idle,
    Offline,
}

impl DeviceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Moving => "moving",
            Self::Idle => "idle",
            Self::Offline => "offline",
        }
    }
}

/// Current position of each device, keyed by device id.
///
/// When a device has several positions, the first in collection order wins.
#[derive(Debug, Default)]
pub struct PositionIndex<'a> {
    by_device: HashMap<i64, &'a Position>,
}

impl<'a> PositionIndex<'a> {
    pub fn build(positions: &'a [Position]) -> Self {
        let mut by_device = HashMap::with_capacity(positions.len());
        for position in positions {
            by_device.entry(position.device_id).or_insert(position);
        }
        Self { by_device }
    }

    pub fn get(&self, device_id: i64) -> Option<&'a Position> {
        self.by_device.get(&device_id).copied()
    }
}

/// Classifies a device given its current position.
pub fn classify(device: &Device, position: Option<&Position>) -> DeviceState {
    let Some(position) = position else {
        return DeviceState::Offline;
    };
    match device.status {
        DeviceStatus::Offline => DeviceState::Offline,
        DeviceStatus::Online if position.speed > 0.0 => DeviceState::Moving,
        DeviceStatus::Online => DeviceState::Idle,
        DeviceStatus::Unknown => DeviceState::Offline,
    }
}

/// Runs one aggregation pass stamped with the current wall-clock time.
pub fn aggregate(
    devices: &[Device],
    positions: &[Position],
    fuel_requests: &[FuelRequest],
) -> FleetAggregate {
    aggregate_at(devices, positions, fuel_requests, Utc::now())
}

/// Runs one aggregation pass stamped with `timestamp`.
pub fn aggregate_at(
    devices: &[Device],
    positions: &[Position],
    fuel_requests: &[FuelRequest],
    timestamp: DateTime<Utc>,
) -> FleetAggregate {
    let index = PositionIndex::build(positions);
    let device_stats = device_stats(devices, &index);

    FleetAggregate {
        alert_stats: alert_stats(devices, &index),
        efficiency_metrics: efficiency_metrics(devices.len(), positions, device_stats.moving),
        fuel_stats: fuel_stats(fuel_requests),
        device_stats,
        timestamp,
    }
}

pub fn device_stats(devices: &[Device], index: &PositionIndex<'_>) -> DeviceStats {
    let mut stats = DeviceStats {
        total: devices.len() as u64,
        ..Default::default()
    };

    for device in devices {
        match classify(device, index.get(device.id)) {
            DeviceState::Moving => {
                stats.active += 1;
                stats.moving += 1;
            }
            DeviceState::Idle => stats.idle += 1,
            DeviceState::Offline => stats.offline += 1,
        }
    }

    stats.active_percentage = percentage(stats.active, stats.total);
    stats.online_percentage = percentage(stats.active + stats.idle, stats.total);
    stats
}

pub fn fuel_stats(requests: &[FuelRequest]) -> FuelStats {
    let mut stats = FuelStats {
        total: requests.len() as u64,
        ..Default::default()
    };

    for request in requests {
        match &request.status {
            FuelRequestStatus::Pending => stats.pending += 1,
            FuelRequestStatus::Approved => stats.approved += 1,
            FuelRequestStatus::Rejected => stats.rejected += 1,
            FuelRequestStatus::Fulfilled => stats.fulfilled += 1,
            FuelRequestStatus::Cancelled => stats.cancelled += 1,
            FuelRequestStatus::Unrecognized(raw) => {
                tracing::warn!(
                    request_id = request.id,
                    status = %raw,
                    "Fuel request has unrecognized status"
                );
                stats.unrecognized += 1;
            }
        }

        match request.urgency {
            FuelUrgency::Urgent => stats.urgent += 1,
            FuelUrgency::Emergency => stats.emergency += 1,
            FuelUrgency::Normal => {}
        }

        stats.total_requested += request.requested_amount;
        stats.total_cost += request.estimated_cost;
    }

    stats.average_request_size =
        round_half_up(safe_div(stats.total_requested, stats.total as f64));
    stats
}

pub fn alert_stats(devices: &[Device], index: &PositionIndex<'_>) -> AlertStats {
    let mut stats = AlertStats::default();

    for device in devices {
        let position = index.get(device.id);

        if classify(device, position) == DeviceState::Offline {
            stats.offline += 1;
            stats.critical += 1;
        }

        let attributes = position.map(|p| &p.attributes);

        if attributes
            .and_then(|a| a.fuel)
            .is_some_and(|fuel| fuel < LOW_FUEL_THRESHOLD)
        {
            stats.low_fuel += 1;
            stats.warning += 1;
        }

        if attributes
            .and_then(|a| a.odometer)
            .is_some_and(is_maintenance_due)
        {
            stats.maintenance_due += 1;
            stats.info += 1;
        }
    }

    stats.total = stats.critical + stats.warning + stats.info;
    stats
}

/// True while the odometer sits within the window just past an interval mark.
pub fn is_maintenance_due(odometer: f64) -> bool {
    odometer.rem_euclid(MAINTENANCE_INTERVAL) < MAINTENANCE_WINDOW
}

pub fn efficiency_metrics(
    device_count: usize,
    positions: &[Position],
    moving: u64,
) -> EfficiencyMetrics {
    let moving_speeds: Vec<f64> = positions
        .iter()
        .map(|p| p.speed)
        .filter(|speed| *speed > 0.0)
        .collect();
    let average_speed = safe_div(moving_speeds.iter().sum(), moving_speeds.len() as f64);

    let total_distance = positions
        .iter()
        .filter_map(|p| p.attributes.total_distance)
        .sum::<f64>()
        / UNITS_PER_KM;

    EfficiencyMetrics {
        average_speed,
        total_distance,
        utilization_rate: percentage(moving, device_count as u64),
    }
}
