//! Top-performer ranking.

use std::cmp::Ordering;

use crate::models::{Device, PerformerMetric, Position, TopPerformer};
use crate::services::aggregation::PositionIndex;

pub const DEFAULT_TOP_PERFORMERS: usize = 5;

/// Ranks devices by `metric`, highest first, keeping at most `limit`.
///
/// Values come from each device's current position; a device without one, or
/// without the attribute, ranks with 0. Ties keep collection order.
pub fn top_performers(
    devices: &[Device],
    positions: &[Position],
    metric: PerformerMetric,
    limit: usize,
) -> Vec<TopPerformer> {
    let index = PositionIndex::build(positions);

    let mut ranked: Vec<TopPerformer> = devices
        .iter()
        .map(|device| TopPerformer {
            device_id: device.id,
            name: device.name.clone(),
            metric,
            value: index
                .get(device.id)
                .map(|position| metric_value(position, metric))
                .unwrap_or(0.0),
        })
        .collect();

    ranked.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
    ranked.truncate(limit);
    ranked
}

fn metric_value(position: &Position, metric: PerformerMetric) -> f64 {
    match metric {
        PerformerMetric::Distance => position.attributes.total_distance.unwrap_or(0.0),
        PerformerMetric::Speed => position.speed,
        PerformerMetric::Fuel => position.attributes.fuel.unwrap_or(0.0),
    }
}
