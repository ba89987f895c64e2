//! Integration tests for sync status and forced refresh.

mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use common::{
    create_test_app, create_test_app_with, empty_request, get_request, seed_fleet, send,
    test_config, FakeUpstream,
};
use domain::models::{Resource, SessionContext, SessionProvider, UserIdentity};

#[tokio::test]
async fn test_status_before_sync() {
    let app = create_test_app();

    let (status, body) = send(&app.router, get_request("/api/v1/sync/status")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authenticated"], false);
    assert!(body["lastReport"].is_null());

    let resources = body["resources"].as_array().unwrap();
    assert_eq!(resources.len(), Resource::ALL.len());
    assert_eq!(resources[0]["resource"], "devices");
    assert_eq!(resources[0]["recordCount"], 0);
    assert!(resources[0]["lastOutcome"].is_null());
}

#[tokio::test]
async fn test_refresh_fetches_every_collection() {
    let app = create_test_app();
    seed_fleet(&app.upstream);

    let (status, body) = send(&app.router, empty_request(Method::POST, "/api/v1/sync/refresh")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.upstream.calls(), Resource::ALL.len());

    let outcomes = body["outcomes"].as_array().unwrap();
    assert_eq!(outcomes.len(), Resource::ALL.len());
    let devices = outcomes
        .iter()
        .find(|o| o["resource"] == "devices")
        .unwrap();
    assert_eq!(devices["outcome"], "fetched");
    assert_eq!(devices["count"], 3);

    let (_, status_body) = send(&app.router, get_request("/api/v1/sync/status")).await;
    assert!(status_body["lastReport"].is_object());
    assert_eq!(status_body["resources"][0]["recordCount"], 3);
}

#[tokio::test]
async fn test_failed_collection_is_published_empty() {
    let app = create_test_app();
    seed_fleet(&app.upstream);

    send(&app.router, empty_request(Method::POST, "/api/v1/sync/refresh")).await;
    assert_eq!(app.state.store.len(Resource::Positions), 2);

    app.upstream.fail(Resource::Positions);
    let (_, body) = send(&app.router, empty_request(Method::POST, "/api/v1/sync/refresh")).await;

    let positions = body["outcomes"]
        .as_array()
        .unwrap()
        .iter()
        .find(|o| o["resource"] == "positions")
        .unwrap()
        .clone();
    assert_eq!(positions["outcome"], "failed");
    assert!(positions["reason"].as_str().unwrap().contains("502"));

    // Other collections are unaffected.
    assert_eq!(app.state.store.len(Resource::Positions), 0);
    assert_eq!(app.state.store.len(Resource::Devices), 3);
}

#[tokio::test]
async fn test_refresh_sends_token_and_identity_hint() {
    let mut config = test_config();
    config.upstream.token = "secret-token".to_string();
    config.upstream.user_id = Some(42);

    let app = create_test_app_with(config, Arc::new(FakeUpstream::new()));
    send(&app.router, empty_request(Method::POST, "/api/v1/sync/refresh")).await;

    let credentials = app.upstream.last_credentials().unwrap();
    assert_eq!(credentials.token.as_deref(), Some("secret-token"));
    assert_eq!(credentials.user_id, Some(42));
}

#[tokio::test]
async fn test_session_transition_triggers_single_fetch() {
    let app = create_test_app_with(test_config(), Arc::new(FakeUpstream::new()));

    app.session.set(SessionContext::signed_in(Some(UserIdentity {
        id: 7,
        attributes: Default::default(),
    })));
    let session = app.session.context();

    assert!(app.state.sync.sync_session(&session).await.is_some());
    assert!(app.state.sync.sync_session(&session).await.is_none());
    assert_eq!(app.upstream.calls(), Resource::ALL.len());

    let (_, body) = send(&app.router, get_request("/api/v1/sync/status")).await;
    assert_eq!(body["authenticated"], true);
}
