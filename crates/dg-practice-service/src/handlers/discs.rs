//! Disc handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use dg_practice_core::{lenient, Disc, DiscId, FlightNumbers, StatsSummary, ValidationError};
use dg_practice_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::state::AppState;

/// A disc with its accuracy figures.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscResponse {
    /// The disc record.
    #[serde(flatten)]
    pub disc: Disc,
    /// Alias, or brand and model.
    pub display_name: String,
    /// Accuracy figures from the disc's stats.
    pub stats: StatsSummary,
}

impl DiscResponse {
    /// Build the view of `disc`, reading its stats from the store.
    pub fn load(state: &AppState, disc: Disc) -> Result<Self, ApiError> {
        let stats = state
            .store
            .get_disc_stats(&disc.user_id, &disc.id)?
            .unwrap_or_default();
        Ok(Self {
            display_name: disc.display_name(),
            stats: stats.summary(),
            disc,
        })
    }
}

/// List the user's discs with stats.
pub(crate) fn load_discs(state: &AppState, auth: &AuthUser) -> Result<Vec<DiscResponse>, ApiError> {
    state
        .store
        .list_discs_by_user(&auth.user_id)?
        .into_iter()
        .map(|disc| DiscResponse::load(state, disc))
        .collect()
}

/// Create disc request.
#[derive(Debug, Deserialize)]
pub struct CreateDiscRequest {
    /// Manufacturer name.
    pub brand: String,
    /// Mold name.
    pub model: String,
    /// Optional nickname.
    #[serde(default)]
    pub alias: Option<String>,
    /// Plastic blend.
    #[serde(default)]
    pub plastic: Option<String>,
    /// Weight in grams; numeric strings are accepted.
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub weight: Option<f64>,
    /// Color description.
    #[serde(default)]
    pub color: Option<String>,
    /// Flight numbers as an object or as `"speed|glide|turn|fade"`.
    #[serde(default, deserialize_with = "FlightNumbers::deserialize_any")]
    pub flight: FlightNumbers,
    /// Stored image file name.
    #[serde(default)]
    pub image: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Blank(field));
    }
    Ok(value.to_string())
}

/// Add a disc to the user's bag.
pub async fn create_disc(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<CreateDiscRequest>,
) -> Result<(StatusCode, Json<DiscResponse>), ApiError> {
    let mut disc = Disc::new(
        auth.user_id,
        required(&body.brand, "brand")?,
        required(&body.model, "model")?,
    );
    disc.alias = non_blank(body.alias);
    disc.plastic = non_blank(body.plastic);
    disc.weight = body.weight;
    disc.color = non_blank(body.color);
    disc.flight = body.flight;
    disc.image = non_blank(body.image);

    state.store.put_disc(&disc)?;

    tracing::info!(user_id = %auth.user_id, disc_id = %disc.id, "Disc created");

    Ok((StatusCode::CREATED, Json(DiscResponse::load(&state, disc)?)))
}

/// List the user's discs.
pub async fn list_discs(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<DiscResponse>>, ApiError> {
    Ok(Json(load_discs(&state, &auth)?))
}

/// Get one disc with its stats.
pub async fn get_disc(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(disc_id): Path<String>,
) -> Result<Json<DiscResponse>, ApiError> {
    let disc_id: DiscId = parse_id(&disc_id, "disc")?;
    let disc = state
        .store
        .get_disc(&auth.user_id, &disc_id)?
        .ok_or_else(|| ApiError::not_found("disc", disc_id))?;

    Ok(Json(DiscResponse::load(&state, disc)?))
}

/// Delete a disc. Its stats go with it; sessions are kept.
pub async fn delete_disc(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(disc_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let disc_id: DiscId = parse_id(&disc_id, "disc")?;
    state.store.delete_disc(&auth.user_id, &disc_id)?;

    tracing::info!(user_id = %auth.user_id, disc_id = %disc_id, "Disc deleted");

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Compare query parameters.
#[derive(Debug, Deserialize)]
pub struct CompareQuery {
    /// Comma-separated disc IDs.
    #[serde(default)]
    pub ids: Option<String>,
}

/// Discs side by side.
#[derive(Debug, Serialize)]
pub struct CompareResponse {
    /// The requested discs the user owns, in request order.
    pub discs: Vec<DiscResponse>,
}

/// Compare several of the user's discs. Unknown IDs are skipped.
pub async fn compare_discs(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<CompareQuery>,
) -> Result<Json<CompareResponse>, ApiError> {
    let mut seen = Vec::new();
    let mut discs = Vec::new();

    let requested = query
        .ids
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .filter_map(|raw| raw.trim().parse::<DiscId>().ok());

    for disc_id in requested {
        if seen.contains(&disc_id) {
            continue;
        }
        seen.push(disc_id);
        if let Some(disc) = state.store.get_disc(&auth.user_id, &disc_id)? {
            discs.push(DiscResponse::load(&state, disc)?);
        }
    }

    Ok(Json(CompareResponse { discs }))
}
