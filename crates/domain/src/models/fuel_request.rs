//! Fuel request domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use validator::Validate;

/// Lifecycle status of a fuel request.
///
/// The five known statuses are matched exhaustively by the aggregation engine.
/// Any other value from the upstream source is kept verbatim in
/// [`FuelRequestStatus::Unrecognized`] so it can be counted and reported
/// instead of being dropped or misfiled.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FuelRequestStatus {
    Pending,
    Approved,
    Rejected,
    Fulfilled,
    Cancelled,
    Unrecognized(String),
}

impl FuelRequestStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Fulfilled => "fulfilled",
            Self::Cancelled => "cancelled",
            Self::Unrecognized(raw) => raw.as_str(),
        }
    }

    /// Parses a wire value, preserving unknown values.
    pub fn parse(value: &str) -> Self {
        match value {
            "pending" => Self::Pending,
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            "fulfilled" => Self::Fulfilled,
            "cancelled" => Self::Cancelled,
            other => Self::Unrecognized(other.to_string()),
        }
    }
}

/// A request sent without a status counts as unrecognized, with an empty raw value.
impl Default for FuelRequestStatus {
    fn default() -> Self {
        Self::Unrecognized(String::new())
    }
}

impl std::fmt::Display for FuelRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for FuelRequestStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FuelRequestStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Non-string values (null, numbers) are kept as their JSON text.
        Ok(match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(raw) => Self::parse(&raw),
            other => Self::Unrecognized(other.to_string()),
        })
    }
}

/// Urgency of a fuel request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FuelUrgency {
    Urgent,
    Emergency,
    #[default]
    #[serde(other)]
    Normal,
}

/// A driver's request for fuel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FuelRequest {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<i64>,
    #[serde(default)]
    pub status: FuelRequestStatus,
    #[serde(default)]
    pub urgency: FuelUrgency,
    #[validate(custom(function = "shared::validation::validate_amount"))]
    #[serde(default)]
    pub requested_amount: f64,
    #[validate(custom(function = "shared::validation::validate_amount"))]
    #[serde(default)]
    pub estimated_cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl FuelRequest {
    pub fn new(id: i64, status: FuelRequestStatus, urgency: FuelUrgency) -> Self {
        Self {
            id,
            device_id: None,
            driver_id: None,
            status,
            urgency,
            requested_amount: 0.0,
            estimated_cost: 0.0,
            created_at: None,
        }
    }

    pub fn with_amounts(mut self, requested_amount: f64, estimated_cost: f64) -> Self {
        self.requested_amount = requested_amount;
        self.estimated_cost = estimated_cost;
        self
    }
}
