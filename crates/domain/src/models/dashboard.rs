//! Dashboard metrics domain models.
//!
//! Everything here is derived: recomputed on every aggregation pass and never
//! persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fleet-wide device counts by classification.
///
/// `active + idle + offline == total` always holds. `moving` equals `active`;
/// both are kept because the dashboard shows them under different headings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStats {
    pub total: u64,
    pub active: u64,
    pub idle: u64,
    pub offline: u64,
    pub moving: u64,
    pub active_percentage: u32,
    pub online_percentage: u32,
}

/// Fuel request counts and totals.
///
/// The six per-status counts (including `unrecognized`) sum to `total`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelStats {
    pub total: u64,
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
    pub fulfilled: u64,
    pub cancelled: u64,
    /// Requests whose status was outside the five known values.
    pub unrecognized: u64,
    pub urgent: u64,
    pub emergency: u64,
    pub total_requested: f64,
    pub total_cost: f64,
    pub average_request_size: f64,
}

/// Alert counts by severity and by cause.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertStats {
    pub total: u64,
    pub critical: u64,
    pub warning: u64,
    pub info: u64,
    pub low_fuel: u64,
    pub maintenance_due: u64,
    pub offline: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EfficiencyMetrics {
    /// Mean speed over moving positions.
    pub average_speed: f64,
    /// Accumulated distance in kilometers.
    pub total_distance: f64,
    /// Percentage of devices currently moving.
    pub utilization_rate: u32,
}

/// Output of one aggregation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetAggregate {
    pub device_stats: DeviceStats,
    pub fuel_stats: FuelStats,
    pub alert_stats: AlertStats,
    pub efficiency_metrics: EfficiencyMetrics,
    pub timestamp: DateTime<Utc>,
}

impl FleetAggregate {
    /// An all-zero aggregate stamped with `timestamp`.
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            device_stats: DeviceStats::default(),
            fuel_stats: FuelStats::default(),
            alert_stats: AlertStats::default(),
            efficiency_metrics: EfficiencyMetrics::default(),
            timestamp,
        }
    }

    /// The live snapshot recorded into the history window.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            timestamp: self.timestamp,
            device_stats: self.device_stats.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    #[default]
    Neutral,
}

/// Change of a metric between two passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trend {
    pub direction: TrendDirection,
    /// Absolute change relative to the previous value, in whole percent.
    pub percentage: u64,
    /// Signed difference `current - previous`.
    pub value: f64,
}

/// A timestamped device-stats entry in a history series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub device_stats: DeviceStats,
}

/// Trends shown next to the headline dashboard numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardTrends {
    pub active_devices: Trend,
    pub online_percentage: Trend,
    pub alerts: Trend,
    pub pending_fuel_requests: Trend,
}

/// Latest aggregate together with its trends against the previous pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    #[serde(flatten)]
    pub aggregate: FleetAggregate,
    pub trends: DashboardTrends,
}

/// Metric used to rank devices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformerMetric {
    #[default]
    Distance,
    Speed,
    Fuel,
}

impl std::str::FromStr for PerformerMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "distance" => Ok(Self::Distance),
            "speed" => Ok(Self::Speed),
            "fuel" => Ok(Self::Fuel),
            _ => Err(format!("Invalid performer metric: {}", s)),
        }
    }
}

/// A ranked device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopPerformer {
    pub device_id: i64,
    pub name: String,
    pub metric: PerformerMetric,
    pub value: f64,
}
