//! Trend deltas between two aggregation passes.

use shared::ratio::round_half_up;

use crate::models::{DashboardTrends, FleetAggregate, Trend, TrendDirection};

/// Change from `previous` to `current`.
///
/// An absent or zero previous value yields a neutral trend with zero change.
pub fn trend(current: f64, previous: Option<f64>) -> Trend {
    let previous = match previous {
        Some(previous) if previous != 0.0 => previous,
        _ => return Trend::default(),
    };

    let value = current - previous;
    let direction = if value > 0.0 {
        TrendDirection::Up
    } else if value < 0.0 {
        TrendDirection::Down
    } else {
        TrendDirection::Neutral
    };

    Trend {
        direction,
        percentage: round_half_up(value / previous * 100.0).abs() as u64,
        value,
    }
}

/// Headline trends of `current` against the previous pass, if any.
pub fn dashboard_trends(
    current: &FleetAggregate,
    previous: Option<&FleetAggregate>,
) -> DashboardTrends {
    DashboardTrends {
        active_devices: trend(
            current.device_stats.active as f64,
            previous.map(|p| p.device_stats.active as f64),
        ),
        online_percentage: trend(
            current.device_stats.online_percentage as f64,
            previous.map(|p| p.device_stats.online_percentage as f64),
        ),
        alerts: trend(
            current.alert_stats.total as f64,
            previous.map(|p| p.alert_stats.total as f64),
        ),
        pending_fuel_requests: trend(
            current.fuel_stats.pending as f64,
            previous.map(|p| p.fuel_stats.pending as f64),
        ),
    }
}
