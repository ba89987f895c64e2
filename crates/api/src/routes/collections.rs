//! Read access to the published collections.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde_json::Value;

use domain::models::Resource;

use crate::app::AppState;
use crate::error::ApiError;

/// Build the collections router.
pub fn router() -> Router<AppState> {
    Router::new().route("/:resource", get(get_collection))
}

/// GET /api/v1/collections/:resource
async fn get_collection(
    State(state): State<AppState>,
    Path(resource): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let resource: Resource = resource.parse().map_err(ApiError::NotFound)?;
    Ok(Json(state.store.to_json(resource)?))
}
