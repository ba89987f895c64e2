//! Foreground client registration and mailboxes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domain::models::ClientMessage;
use domain::services::notification::DEFAULT_ROUTE;

use crate::app::AppState;
use crate::error::ApiError;

/// Build the clients router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(register_client))
        .route("/:client_id", delete(unregister_client))
        .route("/:client_id/messages", get(drain_messages))
}

#[derive(Debug, Default, Deserialize)]
pub struct RegisterClientRequest {
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredClient {
    pub id: Uuid,
    pub url: String,
}

/// POST /api/v1/clients
///
/// Optional body `{"url": "/current/route"}`.
async fn register_client(
    State(state): State<AppState>,
    body: String,
) -> Result<(StatusCode, Json<RegisteredClient>), ApiError> {
    let request: RegisterClientRequest = if body.trim().is_empty() {
        RegisterClientRequest::default()
    } else {
        serde_json::from_str(&body)
            .map_err(|e| ApiError::Validation(format!("Invalid client body: {}", e)))?
    };

    let url = request
        .url
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ROUTE.to_string());
    let id = state.clients.register(url.clone());
    tracing::info!(client_id = %id, url = %url, "Client registered");

    Ok((StatusCode::CREATED, Json(RegisteredClient { id, url })))
}

/// DELETE /api/v1/clients/:client_id
async fn unregister_client(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.clients.unregister(client_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Client not found".to_string()))
    }
}

/// GET /api/v1/clients/:client_id/messages
///
/// Returns and clears the client's pending messages.
async fn drain_messages(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
) -> Result<Json<Vec<ClientMessage>>, ApiError> {
    state
        .clients
        .drain(client_id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Client not found".to_string()))
}
