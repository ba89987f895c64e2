//! Periodic collection refresh.

use std::sync::Arc;

use tracing::debug;

use domain::models::SessionProvider;

use super::scheduler::{Job, JobFrequency};
use crate::services::SyncController;

/// Keeps the published collections fresh while the session is signed in.
///
/// Each run first reports the session state to the controller, so a sign-in
/// since the last run triggers the transition fetch. Otherwise a signed-in
/// session gets a forced refresh and a signed-out one is skipped.
pub struct SyncCollectionsJob {
    controller: Arc<SyncController>,
    session: Arc<dyn SessionProvider>,
    interval_secs: u64,
}

impl SyncCollectionsJob {
    pub fn new(
        controller: Arc<SyncController>,
        session: Arc<dyn SessionProvider>,
        interval_secs: u64,
    ) -> Self {
        Self {
            controller,
            session,
            interval_secs,
        }
    }
}

#[async_trait::async_trait]
impl Job for SyncCollectionsJob {
    fn name(&self) -> &'static str {
        "sync_collections"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(self.interval_secs)
    }

    async fn execute(&self) -> Result<(), String> {
        let session = self.session.context();

        let report = match self.controller.sync_session(&session).await {
            Some(report) => report,
            None if session.authenticated => self.controller.refresh(session.user_id()).await,
            None => {
                debug!("Session signed out, skipping collection refresh");
                return Ok(());
            }
        };

        let failed = report.failure_count();
        if failed == report.outcomes.len() {
            return Err(format!("All {} collections failed to sync", failed));
        }
        Ok(())
    }
}
