use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use fleet_pulse_api::app::{create_app, AppState};
use fleet_pulse_api::config::Config;
use fleet_pulse_api::jobs::{JobScheduler, SyncCollectionsJob};
use fleet_pulse_api::middleware::{init_metrics, logging::init_logging};
use fleet_pulse_api::services::{spawn_aggregation_task, HttpResourceFetcher};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    init_logging(&config.logging)?;
    init_metrics()?;

    info!("Starting Fleet Pulse v{}", env!("CARGO_PKG_VERSION"));

    let fetcher = Arc::new(HttpResourceFetcher::new(
        &config.upstream.base_url,
        config.fetch_timeout(),
    )?);
    let state = AppState::new(config.clone(), fetcher);

    let mut scheduler = JobScheduler::new();
    scheduler.register(SyncCollectionsJob::new(
        state.sync.clone(),
        state.session.clone(),
        config.sync.refresh_interval_secs,
    ));
    scheduler.track(spawn_aggregation_task(
        state.dashboard.clone(),
        Duration::from_millis(config.dashboard.aggregation_debounce_ms),
        scheduler.shutdown_signal(),
    ));

    if config.sync.sync_on_startup {
        let session = state.session.context();
        match state.sync.sync_session(&session).await {
            Some(report) if report.failure_count() > 0 => warn!(
                failed = report.failure_count(),
                "Startup sync completed with failures"
            ),
            Some(report) => info!(duration_ms = report.duration_ms, "Startup sync completed"),
            None => info!("Session signed out, skipping startup sync"),
        }
    }

    scheduler.start();

    let app = create_app(state);

    let addr = config.socket_addr()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(10)).await;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
