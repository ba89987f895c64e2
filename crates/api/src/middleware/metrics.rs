//! Prometheus metrics.
//!
//! HTTP request metrics plus the sync, aggregation and notification counters.

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{header, Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

use domain::models::{DeviceStats, Resource};
use domain::services::DeviceState;

use crate::error::ApiError;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Middleware to record HTTP request metrics.
///
/// Records the following metrics:
/// - `http_requests_total`: Counter with labels (method, path, status)
/// - `http_request_duration_seconds`: Histogram with labels (method, path)
pub async fn metrics_middleware(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = method_to_str(req.method());
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let response = next.run(req).await;

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!(
        "http_requests_total",
        "method" => method,
        "path" => path.clone(),
        "status" => status
    )
    .increment(1);

    histogram!(
        "http_request_duration_seconds",
        "method" => method,
        "path" => path
    )
    .record(duration);

    response
}

/// Convert HTTP method to string for metric labels.
fn method_to_str(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::POST => "POST",
        Method::PUT => "PUT",
        Method::DELETE => "DELETE",
        Method::PATCH => "PATCH",
        Method::HEAD => "HEAD",
        Method::OPTIONS => "OPTIONS",
        _ => "OTHER",
    }
}

/// Records one collection fetch. `outcome` is `fetched` or `failed`.
pub fn record_fetch(resource: Resource, outcome: &'static str) {
    counter!(
        "fleet_sync_fetches_total",
        "resource" => resource.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Records a collection that fell back to empty.
pub fn record_sync_failure(resource: Resource) {
    counter!("fleet_sync_failures_total", "resource" => resource.as_str()).increment(1);
}

pub fn record_aggregation(duration_secs: f64, stats: &DeviceStats) {
    histogram!("fleet_aggregation_duration_seconds").record(duration_secs);
    let by_state = [
        (DeviceState::Moving, stats.moving),
        (DeviceState::Idle, stats.idle),
        (DeviceState::Offline, stats.offline),
    ];
    for (state, count) in by_state {
        gauge!("fleet_devices", "state" => state.as_str()).set(count as f64);
    }
}

pub fn record_notification_shown(replaced: usize, malformed: bool) {
    counter!("notifications_shown_total").increment(1);
    if replaced > 0 {
        counter!("notifications_replaced_total").increment(replaced as u64);
    }
    if malformed {
        counter!("notifications_malformed_total").increment(1);
    }
}

/// Handler for /metrics endpoint that returns Prometheus text format.
pub async fn metrics_handler() -> Result<impl IntoResponse, ApiError> {
    let handle = PROMETHEUS_HANDLE.get().ok_or_else(|| {
        ApiError::ServiceUnavailable("Metrics recorder is not installed".to_string())
    })?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    ))
}

/// Install the Prometheus recorder as the global metrics recorder.
///
/// Call once at startup before anything is recorded. Later calls are no-ops.
pub fn init_metrics() -> Result<(), BuildError> {
    if PROMETHEUS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .set_buckets(&[
            0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0,
        ])?
        .install_recorder()?;

    if PROMETHEUS_HANDLE.set(handle).is_err() {
        tracing::warn!("Prometheus handle already initialized");
    }
    Ok(())
}
