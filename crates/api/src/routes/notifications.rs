//! Notification receiver routes.
//!
//! Push deliveries and foreground commands are displayed through the receiver,
//! so at most one notification per tag is ever visible.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain::models::{ClientMessage, DisplayedNotification, InboundMessage};
use domain::services::{ClickOutcome, DisplayOutcome};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_notification_shown;

/// Build the notifications router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/push", post(receive_push))
        .route("/messages", post(receive_message))
        .route("/:tag/click", post(click_notification))
        .route("/:tag", delete(dismiss_notification))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayResponse {
    pub notification: DisplayedNotification,
    pub replaced: usize,
    pub fallback: bool,
}

impl From<DisplayOutcome> for DisplayResponse {
    fn from(outcome: DisplayOutcome) -> Self {
        Self {
            notification: outcome.notification,
            replaced: outcome.replaced,
            fallback: outcome.fallback,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ClickRequest {
    pub action: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "routed", rename_all = "camelCase")]
pub enum ClickResponse {
    #[serde(rename_all = "camelCase")]
    Focused { client_id: Uuid, message: ClientMessage },
    #[serde(rename_all = "camelCase")]
    Opened { client_id: Option<Uuid>, url: String },
}

impl From<ClickOutcome> for ClickResponse {
    fn from(outcome: ClickOutcome) -> Self {
        match outcome {
            ClickOutcome::Focused { client, message } => ClickResponse::Focused {
                client_id: client,
                message,
            },
            ClickOutcome::Opened { client, url } => ClickResponse::Opened {
                client_id: client,
                url,
            },
        }
    }
}

/// GET /api/v1/notifications
async fn list_notifications(State(state): State<AppState>) -> Json<Vec<DisplayedNotification>> {
    Json(state.notifications.visible().await)
}

/// POST /api/v1/notifications/push
///
/// The body is the raw push payload: JSON, plain text, or empty.
async fn receive_push(
    State(state): State<AppState>,
    body: String,
) -> (StatusCode, Json<DisplayResponse>) {
    let data = (!body.trim().is_empty()).then_some(body.as_str());
    let outcome = state.notifications.on_push(data).await;
    record_notification_shown(outcome.replaced, outcome.fallback);

    (StatusCode::CREATED, Json(outcome.into()))
}

/// POST /api/v1/notifications/messages
async fn receive_message(
    State(state): State<AppState>,
    Json(message): Json<InboundMessage>,
) -> Result<(StatusCode, Json<DisplayResponse>), ApiError> {
    match &message {
        InboundMessage::ShowNotification { options, .. } => options.validate()?,
    }

    let outcome = state.notifications.on_message(message).await;
    record_notification_shown(outcome.replaced, false);

    Ok((StatusCode::CREATED, Json(outcome.into())))
}

/// POST /api/v1/notifications/:tag/click
///
/// Optional body `{"action": "..."}`; no body is a click on the notification
/// itself.
async fn click_notification(
    State(state): State<AppState>,
    Path(tag): Path<String>,
    body: String,
) -> Result<Json<ClickResponse>, ApiError> {
    let request: ClickRequest = if body.trim().is_empty() {
        ClickRequest::default()
    } else {
        serde_json::from_str(&body)
            .map_err(|e| ApiError::Validation(format!("Invalid click body: {}", e)))?
    };

    let notification = find_visible(&state, &tag).await?;
    let outcome = state
        .notifications
        .on_click(&notification, request.action.as_deref())
        .await;

    Ok(Json(outcome.into()))
}

/// DELETE /api/v1/notifications/:tag
async fn dismiss_notification(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> Result<StatusCode, ApiError> {
    let notification = find_visible(&state, &tag).await?;
    state.notifications.on_close(&notification).await;
    Ok(StatusCode::NO_CONTENT)
}

async fn find_visible(state: &AppState, tag: &str) -> Result<DisplayedNotification, ApiError> {
    state
        .notifications
        .find_by_tag(tag)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("No visible notification with tag {}", tag)))
}
