//! Manufacturer catalog handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use dg_practice_core::Manufacturer;
use dg_practice_store::Store;

use crate::error::ApiError;
use crate::state::AppState;

/// List the manufacturer catalog.
pub async fn list_manufacturers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Manufacturer>>, ApiError> {
    Ok(Json(state.store.list_manufacturers()?))
}
