//! Sync status and forced refresh routes.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::app::AppState;
use crate::services::{ResourceStatus, SyncReport};

/// Build the sync router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(get_status))
        .route("/refresh", post(refresh))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusResponse {
    pub authenticated: bool,
    pub last_report: Option<SyncReport>,
    pub resources: Vec<ResourceStatus>,
}

/// GET /api/v1/sync/status
async fn get_status(State(state): State<AppState>) -> Json<SyncStatusResponse> {
    Json(SyncStatusResponse {
        authenticated: state.session.is_authenticated(),
        last_report: state.sync.last_report(),
        resources: state.sync.status(),
    })
}

/// POST /api/v1/sync/refresh
///
/// Fetches every collection now with the current identity hint.
async fn refresh(State(state): State<AppState>) -> Json<SyncReport> {
    let session = state.session.context();
    tracing::info!(
        authenticated = session.authenticated,
        "Forced collection refresh requested"
    );
    Json(state.sync.refresh(session.user_id()).await)
}
