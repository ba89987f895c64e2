//! Integration tests for the notification receiver and client mailboxes.

mod common;

use axum::http::{Method, StatusCode};
use common::{create_test_app, empty_request, get_request, json_request, send, text_request};
use serde_json::json;

#[tokio::test]
async fn test_push_with_payload() {
    let app = create_test_app();

    let (status, body) = send(
        &app.router,
        json_request(
            Method::POST,
            "/api/v1/notifications/push",
            json!({
                "title": "Fuel request approved",
                "body": "Van 4 may refuel",
                "data": {"requestId": 77},
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["fallback"], false);
    assert_eq!(body["replaced"], 0);
    let notification = &body["notification"];
    assert_eq!(notification["title"], "Fuel request approved");
    assert_eq!(notification["options"]["body"], "Van 4 may refuel");
    assert_eq!(notification["options"]["tag"], "fuel-request");
    assert_eq!(notification["options"]["data"]["requestId"], "77");
}

#[tokio::test]
async fn test_push_without_payload_uses_defaults() {
    let app = create_test_app();

    let (status, body) = send(
        &app.router,
        empty_request(Method::POST, "/api/v1/notifications/push"),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["notification"]["title"], "Fleet Manager");
    assert_eq!(body["notification"]["options"]["body"], "You have a new notification");
    assert_eq!(body["notification"]["options"]["vibrate"], json!([200, 100, 200]));
}

#[tokio::test]
async fn test_malformed_push_shows_raw_text() {
    let app = create_test_app();

    let (status, body) = send(
        &app.router,
        text_request(Method::POST, "/api/v1/notifications/push", "Truck 9 is low on fuel"),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["fallback"], true);
    assert_eq!(body["notification"]["title"], "Fleet Manager");
    assert_eq!(body["notification"]["options"]["body"], "Truck 9 is low on fuel");
}

#[tokio::test]
async fn test_push_with_mistyped_field_is_not_raw_text() {
    let app = create_test_app();

    let (status, body) = send(
        &app.router,
        json_request(
            Method::POST,
            "/api/v1/notifications/push",
            json!({"title": "Fuel approved", "body": "Req 9", "tag": 42}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["fallback"], false);
    assert_eq!(body["notification"]["title"], "Fuel approved");
    assert_eq!(body["notification"]["options"]["body"], "Req 9");
    assert_eq!(body["notification"]["options"]["tag"], "fuel-request");
}

#[tokio::test]
async fn test_same_tag_replaces_previous() {
    let app = create_test_app();
    let push = |title: &str| {
        json_request(
            Method::POST,
            "/api/v1/notifications/push",
            json!({"title": title, "tag": "req-1"}),
        )
    };

    send(&app.router, push("first")).await;
    let (_, body) = send(&app.router, push("second")).await;
    assert_eq!(body["replaced"], 1);

    let (status, visible) = send(&app.router, get_request("/api/v1/notifications")).await;
    assert_eq!(status, StatusCode::OK);
    let visible = visible.as_array().unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0]["title"], "second");
}

#[tokio::test]
async fn test_show_notification_message() {
    let app = create_test_app();

    let (status, body) = send(
        &app.router,
        json_request(
            Method::POST,
            "/api/v1/notifications/messages",
            json!({
                "type": "SHOW_NOTIFICATION",
                "title": "Maintenance due",
                "options": {"tag": "maintenance", "requireInteraction": true},
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["notification"]["title"], "Maintenance due");
    assert_eq!(body["notification"]["options"]["tag"], "maintenance");
    assert_eq!(body["notification"]["options"]["requireInteraction"], true);
}

#[tokio::test]
async fn test_click_without_client_opens_record_route() {
    let app = create_test_app();
    send(
        &app.router,
        json_request(
            Method::POST,
            "/api/v1/notifications/push",
            json!({"title": "New request", "data": {"requestId": "15"}}),
        ),
    )
    .await;

    let (status, body) = send(
        &app.router,
        empty_request(Method::POST, "/api/v1/notifications/fuel-request/click"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["routed"], "opened");
    assert_eq!(body["url"], "/fuel-requests/15");

    let (_, visible) = send(&app.router, get_request("/api/v1/notifications")).await;
    assert_eq!(visible, json!([]));
}

#[tokio::test]
async fn test_click_with_client_delivers_action() {
    let app = create_test_app();

    let (status, client) = send(
        &app.router,
        json_request(Method::POST, "/api/v1/clients", json!({"url": "/dashboard"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let client_id = client["id"].as_str().unwrap().to_string();

    send(
        &app.router,
        json_request(
            Method::POST,
            "/api/v1/notifications/push",
            json!({"title": "New request", "data": {"requestId": "15"}}),
        ),
    )
    .await;

    let (status, body) = send(
        &app.router,
        json_request(
            Method::POST,
            "/api/v1/notifications/fuel-request/click",
            json!({"action": "approve"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["routed"], "focused");
    assert_eq!(body["clientId"], client_id.as_str());

    let uri = format!("/api/v1/clients/{}/messages", client_id);
    let (status, messages) = send(&app.router, get_request(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        messages,
        json!([{"type": "NOTIFICATION_ACTION", "action": "approve", "requestId": "15"}])
    );

    // Draining empties the mailbox.
    let (_, messages) = send(&app.router, get_request(&uri)).await;
    assert_eq!(messages, json!([]));
}

#[tokio::test]
async fn test_dismiss_closes_without_routing() {
    let app = create_test_app();
    send(&app.router, empty_request(Method::POST, "/api/v1/notifications/push")).await;

    let (status, _) = send(
        &app.router,
        empty_request(Method::DELETE, "/api/v1/notifications/fuel-request"),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, visible) = send(&app.router, get_request("/api/v1/notifications")).await;
    assert_eq!(visible, json!([]));
    assert!(app.state.clients.is_empty());
}

#[tokio::test]
async fn test_click_unknown_tag_is_not_found() {
    let app = create_test_app();

    let (status, _) = send(
        &app.router,
        empty_request(Method::POST, "/api/v1/notifications/nothing/click"),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_client_mailbox_is_not_found() {
    let app = create_test_app();
    let uri = format!("/api/v1/clients/{}/messages", uuid::Uuid::new_v4());

    let (status, _) = send(&app.router, get_request(&uri)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unregister_client() {
    let app = create_test_app();
    let (_, client) = send(&app.router, empty_request(Method::POST, "/api/v1/clients")).await;
    assert_eq!(client["url"], "/");

    let uri = format!("/api/v1/clients/{}", client["id"].as_str().unwrap());
    let (status, _) = send(&app.router, empty_request(Method::DELETE, &uri)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app.router, empty_request(Method::DELETE, &uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
