//! Application services: upstream fetching, collection sync, dashboard state
//! and session.

pub mod collections;
pub mod dashboard;
pub mod resource_fetcher;
pub mod session;
pub mod sync_controller;

pub use collections::CollectionStore;
pub use dashboard::{spawn_aggregation_task, DashboardService};
pub use resource_fetcher::{Credentials, FetchError, HttpResourceFetcher, ResourceFetcher};
pub use session::ConfigSessionProvider;
pub use sync_controller::{FetchOutcome, ResourceOutcome, ResourceStatus, SyncController, SyncReport};
