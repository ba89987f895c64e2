//! Synchronization controller.
//!
//! Fetches every tracked collection when the session becomes authenticated
//! (or on a forced refresh) and publishes each one independently. A failed
//! fetch publishes an empty collection; it never blocks the others.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use domain::models::{Resource, SessionContext, UserId};

use super::collections::CollectionStore;
use super::resource_fetcher::{Credentials, FetchError, ResourceFetcher};
use crate::middleware::metrics::{record_fetch, record_sync_failure};

/// Result of fetching one collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum FetchOutcome {
    Fetched { count: usize },
    Failed { reason: String },
}

impl FetchOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, FetchOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceOutcome {
    pub resource: Resource,
    #[serde(flatten)]
    pub outcome: FetchOutcome,
}

/// Outcome of one sync pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub outcomes: Vec<ResourceOutcome>,
}

impl SyncReport {
    pub fn outcome(&self, resource: Resource) -> Option<&FetchOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.resource == resource)
            .map(|o| &o.outcome)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ResourceOutcome> {
        self.outcomes.iter().filter(|o| o.outcome.is_failure())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }
}

/// Latest sync state of one collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStatus {
    pub resource: Resource,
    pub record_count: usize,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub last_outcome: Option<FetchOutcome>,
}

pub struct SyncController {
    fetcher: Arc<dyn ResourceFetcher>,
    store: Arc<CollectionStore>,
    token: Option<String>,
    fetch_timeout: Duration,
    authenticated: Mutex<bool>,
    attempts: RwLock<BTreeMap<Resource, (DateTime<Utc>, FetchOutcome)>>,
    last_report: RwLock<Option<SyncReport>>,
}

impl SyncController {
    pub fn new(
        fetcher: Arc<dyn ResourceFetcher>,
        store: Arc<CollectionStore>,
        token: Option<String>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            fetcher,
            store,
            token,
            fetch_timeout,
            authenticated: Mutex::new(false),
            attempts: RwLock::new(BTreeMap::new()),
            last_report: RwLock::new(None),
        }
    }

    pub fn store(&self) -> &Arc<CollectionStore> {
        &self.store
    }

    /// Applies an authentication state observation.
    ///
    /// Fetches everything on a signed-out to signed-in transition and returns
    /// the report; returns `None` when no fetch was due. Signing out fetches
    /// nothing but arms the next sign-in.
    pub async fn sync(&self, authenticated: bool, identity: Option<UserId>) -> Option<SyncReport> {
        let was_authenticated = {
            let mut state = self
                .authenticated
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *state, authenticated)
        };

        match (was_authenticated, authenticated) {
            (false, true) => {
                info!(user_id = ?identity, "Session authenticated, syncing collections");
                Some(self.fetch_all(identity).await)
            }
            (true, false) => {
                info!("Session ended, sync paused until next sign-in");
                None
            }
            _ => None,
        }
    }

    /// [`sync`](Self::sync) driven by a session snapshot.
    pub async fn sync_session(&self, session: &SessionContext) -> Option<SyncReport> {
        self.sync(session.authenticated, session.user_id()).await
    }

    /// Fetches every collection regardless of the last observed state.
    pub async fn refresh(&self, identity: Option<UserId>) -> SyncReport {
        self.fetch_all(identity).await
    }

    pub fn is_authenticated(&self) -> bool {
        *self
            .authenticated
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn last_report(&self) -> Option<SyncReport> {
        self.last_report
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Per-collection status in fetch order.
    pub fn status(&self) -> Vec<ResourceStatus> {
        let attempts = self.attempts.read().unwrap_or_else(PoisonError::into_inner);
        Resource::ALL
            .into_iter()
            .map(|resource| {
                let attempt = attempts.get(&resource);
                ResourceStatus {
                    resource,
                    record_count: self.store.len(resource),
                    last_attempt_at: attempt.map(|(at, _)| *at),
                    last_outcome: attempt.map(|(_, outcome)| outcome.clone()),
                }
            })
            .collect()
    }

    async fn fetch_all(&self, identity: Option<UserId>) -> SyncReport {
        let credentials = Credentials::new(self.token.clone(), identity);
        let started_at = Utc::now();
        let start = Instant::now();

        let outcomes = join_all(
            Resource::ALL
                .into_iter()
                .map(|resource| self.fetch_one(resource, &credentials)),
        )
        .await;

        let report = SyncReport {
            started_at,
            duration_ms: start.elapsed().as_millis() as u64,
            outcomes,
        };

        {
            let mut attempts = self.attempts.write().unwrap_or_else(PoisonError::into_inner);
            for outcome in &report.outcomes {
                attempts.insert(outcome.resource, (started_at, outcome.outcome.clone()));
            }
        }
        *self
            .last_report
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(report.clone());

        info!(
            resources = report.outcomes.len(),
            failed = report.failure_count(),
            duration_ms = report.duration_ms,
            "Sync pass completed"
        );
        report
    }

    async fn fetch_one(&self, resource: Resource, credentials: &Credentials) -> ResourceOutcome {
        let fetched = match tokio::time::timeout(
            self.fetch_timeout,
            self.fetcher.fetch_collection(resource, credentials),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.fetch_timeout.as_millis() as u64)),
        };

        let outcome = match fetched.and_then(|items| self.store.publish(resource, items)) {
            Ok(count) => {
                debug!(resource = %resource, count, "Collection published");
                record_fetch(resource, "fetched");
                FetchOutcome::Fetched { count }
            }
            Err(e) => {
                warn!(
                    resource = %resource,
                    error = %e,
                    "Collection fetch failed, publishing empty collection"
                );
                self.store.clear(resource);
                record_fetch(resource, "failed");
                record_sync_failure(resource);
                FetchOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        ResourceOutcome { resource, outcome }
    }
}
