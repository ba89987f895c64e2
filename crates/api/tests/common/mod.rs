//! Common test utilities for integration tests.
//!
//! The app is wired to a canned upstream instead of a live tracking server.

// Helpers are shared across test binaries and not every binary uses all of them.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{header, Method, Request, Response, StatusCode},
    Router,
};
use fake::{faker::company::en::CompanyName, Fake};
use serde_json::{json, Value};
use tower::ServiceExt;

use domain::models::Resource;
use fleet_pulse_api::{
    app::{create_app, AppState},
    config::Config,
    services::{ConfigSessionProvider, Credentials, FetchError, ResourceFetcher},
};

/// Upstream double serving fixed collections. Resources without an entry
/// return an empty array.
#[derive(Default)]
pub struct FakeUpstream {
    collections: Mutex<HashMap<Resource, Vec<Value>>>,
    failing: Mutex<Vec<Resource>>,
    calls: AtomicUsize,
    last_credentials: Mutex<Option<Credentials>>,
}

impl FakeUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, resource: Resource, items: Vec<Value>) {
        self.collections.lock().unwrap().insert(resource, items);
    }

    pub fn fail(&self, resource: Resource) {
        self.failing.lock().unwrap().push(resource);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_credentials(&self) -> Option<Credentials> {
        self.last_credentials.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ResourceFetcher for FakeUpstream {
    async fn fetch_collection(
        &self,
        resource: Resource,
        credentials: &Credentials,
    ) -> Result<Vec<Value>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_credentials.lock().unwrap() = Some(credentials.clone());

        if self.failing.lock().unwrap().contains(&resource) {
            return Err(FetchError::Status {
                status: 502,
                body: "bad gateway".to_string(),
            });
        }
        Ok(self
            .collections
            .lock()
            .unwrap()
            .get(&resource)
            .cloned()
            .unwrap_or_default())
    }
}

/// Test configuration with a placeholder upstream and no token.
pub fn test_config() -> Config {
    Config::load_for_test(&[
        ("upstream.base_url", "http://tracker.test"),
        ("logging.format", "pretty"),
    ])
    .expect("Failed to load test config")
}

/// A test app plus handles to its upstream double and session.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub upstream: Arc<FakeUpstream>,
    pub session: Arc<ConfigSessionProvider>,
}

pub fn create_test_app_with(config: Config, upstream: Arc<FakeUpstream>) -> TestApp {
    let session = Arc::new(ConfigSessionProvider::from_config(&config.upstream));
    let state = AppState::with_session(config, upstream.clone(), session.clone());
    TestApp {
        router: create_app(state.clone()),
        state,
        upstream,
        session,
    }
}

pub fn create_test_app() -> TestApp {
    create_test_app_with(test_config(), Arc::new(FakeUpstream::new()))
}

pub fn device_json(id: i64, status: &str) -> Value {
    let name: String = CompanyName().fake();
    json!({
        "id": id,
        "name": format!("{} {}", name, id),
        "uniqueId": format!("IMEI-{:06}", id),
        "status": status,
    })
}

pub fn position_json(device_id: i64, speed: f64, fuel: f64, odometer: f64) -> Value {
    json!({
        "id": device_id * 100,
        "deviceId": device_id,
        "speed": speed,
        "latitude": 48.1486,
        "longitude": 17.1077,
        "attributes": {
            "fuel": fuel,
            "odometer": odometer,
            "totalDistance": odometer,
        }
    })
}

pub fn fuel_request_json(id: i64, status: &str, urgency: &str, amount: f64, cost: f64) -> Value {
    json!({
        "id": id,
        "deviceId": 1,
        "status": status,
        "urgency": urgency,
        "requestedAmount": amount,
        "estimatedCost": cost,
    })
}

/// Three devices: one moving with low fuel, one idle, one offline.
pub fn seed_fleet(upstream: &FakeUpstream) {
    upstream.serve(
        Resource::Devices,
        vec![
            device_json(1, "online"),
            device_json(2, "online"),
            device_json(3, "offline"),
        ],
    );
    upstream.serve(
        Resource::Positions,
        vec![
            position_json(1, 42.0, 12.0, 25_000.0),
            position_json(2, 0.0, 80.0, 4_000.0),
        ],
    );
    upstream.serve(
        Resource::FuelRequests,
        vec![
            fuel_request_json(10, "pending", "urgent", 40.0, 60.0),
            fuel_request_json(11, "approved", "normal", 60.0, 90.0),
        ],
    );
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

pub fn text_request(method: Method, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn parse_response_body(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or_else(|_| {
        panic!(
            "Failed to parse response body: {:?}",
            String::from_utf8_lossy(&body)
        )
    })
}

/// Sends `request` and returns the status and JSON body.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        return (status, Value::Null);
    }
    (status, parse_response_body(response).await)
}
