//! Background job scheduler and job implementations.

mod scheduler;
mod sync_collections;

pub use scheduler::{run_once, Job, JobFrequency, JobScheduler};
pub use sync_collections::SyncCollectionsJob;
