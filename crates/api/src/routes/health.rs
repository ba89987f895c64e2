//! Health check endpoint handlers.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use domain::models::Resource;

use crate::app::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub sync: SyncHealth,
    pub dashboard: DashboardHealth,
    pub notifications: NotificationHealth,
}

/// Summary of the last sync pass.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncHealth {
    pub authenticated: bool,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub last_duration_ms: Option<u64>,
    pub failed_resources: Vec<Resource>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardHealth {
    pub recorded_passes: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationHealth {
    pub visible: usize,
    pub clients: usize,
}

/// Simple status response for liveness probes.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Reports `healthy`, or `degraded` when any collection failed its last sync.
///
/// Always 200: a failed upstream degrades the dashboard to empty collections
/// but the service keeps serving.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let report = state.sync.last_report();
    let failed_resources: Vec<Resource> = report
        .as_ref()
        .map(|r| r.failures().map(|o| o.resource).collect())
        .unwrap_or_default();

    Json(HealthResponse {
        status: overall_status(&failed_resources).to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        sync: SyncHealth {
            authenticated: state.session.is_authenticated(),
            last_sync_at: report.as_ref().map(|r| r.started_at),
            last_duration_ms: report.as_ref().map(|r| r.duration_ms),
            failed_resources,
        },
        dashboard: DashboardHealth {
            recorded_passes: state.dashboard.recorded_passes(),
        },
        notifications: NotificationHealth {
            visible: state.notifications.visible().await.len(),
            clients: state.clients.len(),
        },
    })
}

/// Liveness probe endpoint.
pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "alive".to_string(),
    })
}

fn overall_status(failed: &[Resource]) -> &'static str {
    if failed.is_empty() {
        "healthy"
    } else {
        "degraded"
    }
}
