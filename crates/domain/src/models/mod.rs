//! Domain models for Fleet Pulse.

pub mod dashboard;
pub mod device;
pub mod fuel_request;
pub mod notification;
pub mod position;
pub mod reference;
pub mod resource;
pub mod session;

pub use dashboard::{
    AlertStats, DashboardSnapshot, DashboardTrends, DeviceStats, EfficiencyMetrics,
    FleetAggregate, FuelStats, PerformerMetric, StatsSnapshot, TopPerformer, Trend,
    TrendDirection,
};
pub use device::{Device, DeviceStatus};
pub use fuel_request::{FuelRequest, FuelRequestStatus, FuelUrgency};
pub use notification::{
    ClientMessage, DisplayedNotification, InboundMessage, NotificationAction, NotificationData,
    NotificationOptions, NotificationOverrides, PushPayload,
};
pub use position::{Position, PositionAttributes};
pub use reference::{Calendar, Driver, Geofence, Group, Maintenance};
pub use resource::Resource;
pub use session::{SessionContext, SessionProvider, UserId, UserIdentity};
