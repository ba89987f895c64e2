//! Position domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Attributes the dashboard reads from a position.
///
/// The tracking server sends an open attribute map; only these keys are
/// consumed. A key the server did not send stays `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PositionAttributes {
    /// Fuel level in percent.
    #[validate(custom(function = "crate::models::position::validate_optional_fuel"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel: Option<f64>,

    /// Odometer reading in raw server units (meters).
    #[validate(custom(function = "crate::models::position::validate_optional_distance"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub odometer: Option<f64>,

    /// Accumulated distance in raw server units (meters).
    #[validate(custom(function = "crate::models::position::validate_optional_distance"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_distance: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_speed: Option<f64>,
}

/// Latest reported position of a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    #[serde(default)]
    pub id: i64,
    pub device_id: i64,
    #[validate(custom(function = "shared::validation::validate_speed"))]
    #[serde(default)]
    pub speed: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix_time: Option<DateTime<Utc>>,
    #[validate(nested)]
    #[serde(default)]
    pub attributes: PositionAttributes,
}

impl Position {
    pub fn new(device_id: i64, speed: f64) -> Self {
        Self {
            id: device_id,
            device_id,
            speed,
            latitude: None,
            longitude: None,
            fix_time: None,
            attributes: PositionAttributes::default(),
        }
    }

    pub fn with_attributes(mut self, attributes: PositionAttributes) -> Self {
        self.attributes = attributes;
        self
    }
}

/// Validates an optional fuel percentage.
pub fn validate_optional_fuel(level: f64) -> Result<(), validator::ValidationError> {
    shared::validation::validate_fuel_level(level)
}

/// Validates an optional distance accumulator.
pub fn validate_optional_distance(distance: f64) -> Result<(), validator::ValidationError> {
    shared::validation::validate_amount(distance)
}
