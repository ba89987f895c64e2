use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use domain::models::SessionProvider;
use domain::services::{InMemoryClients, InMemorySurface, NotificationReceiver};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, security_headers_middleware, trace_id, SecurityHeaders,
};
use crate::routes::{clients, collections, dashboard, health, notifications, sync};
use crate::services::{
    CollectionStore, ConfigSessionProvider, DashboardService, ResourceFetcher, SyncController,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<CollectionStore>,
    pub sync: Arc<SyncController>,
    pub session: Arc<dyn SessionProvider>,
    pub dashboard: Arc<DashboardService>,
    pub notifications: Arc<NotificationReceiver>,
    pub clients: Arc<InMemoryClients>,
}

impl AppState {
    /// Wires the services around `fetcher` with a config-backed session.
    pub fn new(config: Config, fetcher: Arc<dyn ResourceFetcher>) -> Self {
        let session = Arc::new(ConfigSessionProvider::from_config(&config.upstream));
        Self::with_session(config, fetcher, session)
    }

    pub fn with_session(
        config: Config,
        fetcher: Arc<dyn ResourceFetcher>,
        session: Arc<dyn SessionProvider>,
    ) -> Self {
        let store = Arc::new(CollectionStore::new());
        let sync = Arc::new(SyncController::new(
            fetcher,
            store.clone(),
            config.upstream_token().map(str::to_string),
            config.fetch_timeout(),
        ));
        let dashboard = Arc::new(DashboardService::new(
            store.clone(),
            config.dashboard.history_capacity,
        ));

        let clients = Arc::new(InMemoryClients::new());
        let notifications = Arc::new(NotificationReceiver::new(
            Arc::new(InMemorySurface::new()),
            clients.clone(),
        ));

        Self {
            config: Arc::new(config),
            store,
            sync,
            session,
            dashboard,
            notifications,
            clients,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    let cors = if config.security.cors_origins.is_empty() {
        // Development: allow any origin
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let security_headers = SecurityHeaders {
        hsts: config.security.hsts_enabled,
    };

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    let api_routes = Router::new()
        .nest("/api/v1/dashboard", dashboard::router())
        .nest("/api/v1/sync", sync::router())
        .nest("/api/v1/collections", collections::router())
        .nest("/api/v1/notifications", notifications::router())
        .nest("/api/v1/clients", clients::router());

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn_with_state(
            security_headers,
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
