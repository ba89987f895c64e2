//! Domain services for Fleet Pulse.
//!
//! Aggregation, trend and ranking are pure functions over collection slices.
//! The notification receiver talks to the platform through traits.

pub mod aggregation;
pub mod history;
pub mod notification;
pub mod ranking;
pub mod trend;

pub use aggregation::{aggregate, aggregate_at, classify, DeviceState, PositionIndex};
pub use history::{simulate_history, HistoryWindow};
pub use notification::{
    route_for, ClickOutcome, ClientId, ClientWindows, DisplayOutcome, InMemoryClients,
    InMemorySurface, NotificationReceiver, NotificationSurface,
};
pub use ranking::{top_performers, DEFAULT_TOP_PERFORMERS};
pub use trend::{dashboard_trends, trend};
