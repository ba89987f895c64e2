//! Named resource collections kept in sync with the tracking server.

use serde::{Deserialize, Serialize};

/// A server-sourced collection refreshed as a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resource {
    Devices,
    Positions,
    Geofences,
    Groups,
    Drivers,
    Maintenance,
    Calendars,
    FuelRequests,
}

impl Resource {
    /// Every tracked collection, in fetch order.
    pub const ALL: [Resource; 8] = [
        Resource::Devices,
        Resource::Positions,
        Resource::Geofences,
        Resource::Groups,
        Resource::Drivers,
        Resource::Maintenance,
        Resource::Calendars,
        Resource::FuelRequests,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Devices => "devices",
            Self::Positions => "positions",
            Self::Geofences => "geofences",
            Self::Groups => "groups",
            Self::Drivers => "drivers",
            Self::Maintenance => "maintenance",
            Self::Calendars => "calendars",
            Self::FuelRequests => "fuel-requests",
        }
    }

    /// Path segment below the server's `/api/` root.
    pub fn path(&self) -> &'static str {
        self.as_str()
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resource::ALL
            .into_iter()
            .find(|resource| resource.as_str() == s)
            .ok_or_else(|| format!("Unknown resource: {}", s))
    }
}
