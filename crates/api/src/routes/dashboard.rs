//! Dashboard routes.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

use domain::models::{DashboardSnapshot, PerformerMetric, StatsSnapshot, TopPerformer};
use domain::services::DEFAULT_TOP_PERFORMERS;

use crate::app::AppState;
use crate::config::MAX_HISTORY_HOURS;
use crate::error::ApiError;

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_dashboard))
        .route("/history", get(get_history))
        .route("/top-performers", get(get_top_performers))
}

#[derive(Debug, Deserialize, Validate)]
pub struct HistoryQuery {
    #[validate(range(max = 168, message = "Hours must be at most 168"))]
    pub hours: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HistorySource {
    Recorded,
    Simulated,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub hours: u32,
    pub source: HistorySource,
    pub snapshots: Vec<StatsSnapshot>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TopPerformersQuery {
    pub metric: Option<String>,
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopPerformersResponse {
    pub metric: PerformerMetric,
    pub performers: Vec<TopPerformer>,
}

/// GET /api/v1/dashboard
async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardSnapshot> {
    Json(state.dashboard.current())
}

/// GET /api/v1/dashboard/history?hours=N
async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    query.validate()?;

    let hours = query
        .hours
        .unwrap_or(state.config.dashboard.default_history_hours)
        .min(MAX_HISTORY_HOURS);
    let source = if state.dashboard.recorded_passes() == 0 {
        HistorySource::Simulated
    } else {
        HistorySource::Recorded
    };

    Ok(Json(HistoryResponse {
        hours,
        source,
        snapshots: state.dashboard.history(hours, Utc::now()),
    }))
}

/// GET /api/v1/dashboard/top-performers?metric=&limit=
async fn get_top_performers(
    State(state): State<AppState>,
    Query(query): Query<TopPerformersQuery>,
) -> Result<Json<TopPerformersResponse>, ApiError> {
    query.validate()?;

    let metric = match query.metric.as_deref() {
        Some(name) => name.parse::<PerformerMetric>().map_err(ApiError::Validation)?,
        None => PerformerMetric::default(),
    };
    let limit = query.limit.unwrap_or(DEFAULT_TOP_PERFORMERS);

    Ok(Json(TopPerformersResponse {
        metric,
        performers: state.dashboard.top_performers(metric, limit),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_query_bounds() {
        assert!(HistoryQuery { hours: Some(168) }.validate().is_ok());
        assert!(HistoryQuery { hours: Some(169) }.validate().is_err());
        assert!(HistoryQuery { hours: None }.validate().is_ok());
    }

    #[test]
    fn test_top_performers_query_bounds() {
        let query = |limit| TopPerformersQuery {
            metric: None,
            limit: Some(limit),
        };
        assert!(query(1).validate().is_ok());
        assert!(query(0).validate().is_err());
        assert!(query(101).validate().is_err());
    }
}
