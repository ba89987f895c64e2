//! Live dashboard state.
//!
//! Re-runs the aggregation engine over the published collections, keeps the
//! latest snapshot and a rolling window of past passes.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use domain::models::{DashboardSnapshot, PerformerMetric, StatsSnapshot, TopPerformer};
use domain::services::{aggregate, dashboard_trends, simulate_history, top_performers, HistoryWindow};

use super::collections::CollectionStore;
use crate::middleware::metrics::record_aggregation;

pub struct DashboardService {
    store: Arc<CollectionStore>,
    window: RwLock<HistoryWindow>,
    latest: RwLock<Option<DashboardSnapshot>>,
}

impl DashboardService {
    pub fn new(store: Arc<CollectionStore>, history_capacity: usize) -> Self {
        Self {
            store,
            window: RwLock::new(HistoryWindow::new(history_capacity)),
            latest: RwLock::new(None),
        }
    }

    /// Aggregates the current collections and records the pass.
    pub fn recompute(&self) -> DashboardSnapshot {
        let devices = self.store.devices();
        let positions = self.store.positions();
        let fuel_requests = self.store.fuel_requests();

        let start = Instant::now();
        let aggregate = aggregate(&devices, &positions, &fuel_requests);
        record_aggregation(start.elapsed().as_secs_f64(), &aggregate.device_stats);

        let trends = {
            let mut window = self.window.write().unwrap_or_else(PoisonError::into_inner);
            let trends = dashboard_trends(&aggregate, window.latest());
            window.record(aggregate.clone());
            trends
        };

        let snapshot = DashboardSnapshot { aggregate, trends };
        *self.latest.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());
        snapshot
    }

    /// The latest snapshot, aggregating now if no pass has run yet.
    pub fn current(&self) -> DashboardSnapshot {
        let latest = self
            .latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        latest.unwrap_or_else(|| self.recompute())
    }

    pub fn latest(&self) -> Option<DashboardSnapshot> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Device-stats series covering the last `hours`, oldest first.
    ///
    /// Served from recorded passes; simulated from the current stats until the
    /// first pass is recorded.
    pub fn history(&self, hours: u32, now: DateTime<Utc>) -> Vec<StatsSnapshot> {
        {
            let window = self.window.read().unwrap_or_else(PoisonError::into_inner);
            if !window.is_empty() {
                return window.snapshots_since(hours, now);
            }
        }

        let current = self.current();
        simulate_history(
            &current.aggregate.device_stats,
            hours,
            now,
            &mut rand::thread_rng(),
        )
    }

    pub fn recorded_passes(&self) -> usize {
        self.window
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn top_performers(&self, metric: PerformerMetric, limit: usize) -> Vec<TopPerformer> {
        top_performers(
            &self.store.devices(),
            &self.store.positions(),
            metric,
            limit,
        )
    }
}

/// Re-aggregates whenever devices, positions or fuel requests are republished.
///
/// Changes arriving within `debounce` of each other are folded into one pass,
/// so a sync pass that republishes all three aggregates once.
pub fn spawn_aggregation_task(
    service: Arc<DashboardService>,
    debounce: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let mut devices = service.store.subscribe_devices();
    let mut positions = service.store.subscribe_positions();
    let mut fuel_requests = service.store.subscribe_fuel_requests();

    tokio::spawn(async move {
        info!("Aggregation task started");
        loop {
            let changed = tokio::select! {
                r = devices.changed() => r.is_ok(),
                r = positions.changed() => r.is_ok(),
                r = fuel_requests.changed() => r.is_ok(),
                r = shutdown.changed() => r.is_ok() && !*shutdown.borrow(),
            };
            if !changed || *shutdown.borrow() {
                break;
            }

            tokio::time::sleep(debounce).await;
            let _ = devices.borrow_and_update();
            let _ = positions.borrow_and_update();
            let _ = fuel_requests.borrow_and_update();

            let snapshot = service.recompute();
            debug!(
                devices = snapshot.aggregate.device_stats.total,
                active = snapshot.aggregate.device_stats.active,
                alerts = snapshot.aggregate.alert_stats.total,
                "Dashboard re-aggregated"
            );
        }
        info!("Aggregation task shutting down");
    })
}
