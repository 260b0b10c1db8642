//! Routine handlers, including running a routine.
//!
//! `start` returns everything the run form needs; `complete` takes the submitted
//! form, records the session and applies it to the user's stats in one store
//! transaction.

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Form, Json};
use serde::{Deserialize, Serialize};

use dg_practice_core::{
    parse_distances, Circle, DiscId, FormFields, PracticeError, Routine, RoutineId, SessionMode,
    StatsSummary,
};
use dg_practice_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::discs::{load_discs, DiscResponse};
use crate::handlers::parse_id;
use crate::handlers::sessions::SessionResponse;
use crate::state::AppState;

/// A routine with the circle of each station.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineResponse {
    /// The routine record.
    #[serde(flatten)]
    pub routine: Routine,
    /// Circle each station counts toward, in station order.
    pub circles: Vec<Circle>,
}

impl From<Routine> for RoutineResponse {
    fn from(routine: Routine) -> Self {
        Self {
            circles: routine.circles().collect(),
            routine,
        }
    }
}

/// Station distances as `"7, 12, 15"` or as a list of numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Distances {
    /// Comma-separated text, as typed into the routine form.
    Text(String),
    /// Already-parsed distances.
    List(Vec<f64>),
}

impl Distances {
    fn into_vec(self) -> Vec<f64> {
        match self {
            Self::Text(raw) => parse_distances(&raw),
            Self::List(list) => list,
        }
    }
}

/// Create routine request.
#[derive(Debug, Deserialize)]
pub struct CreateRoutineRequest {
    /// Display name.
    pub name: String,
    /// Station distances.
    pub distances: Distances,
}

/// Update routine request.
#[derive(Debug, Deserialize)]
pub struct UpdateRoutineRequest {
    /// New display name.
    pub name: Option<String>,
    /// New station distances.
    pub distances: Option<Distances>,
}

fn load_routine(state: &AppState, auth: &AuthUser, raw_id: &str) -> Result<Routine, ApiError> {
    let routine_id: RoutineId = parse_id(raw_id, "routine")?;
    state
        .store
        .get_routine(&auth.user_id, &routine_id)?
        .ok_or_else(|| ApiError::not_found("routine", routine_id))
}

/// Create a routine.
pub async fn create_routine(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<CreateRoutineRequest>,
) -> Result<(StatusCode, Json<RoutineResponse>), ApiError> {
    let routine = Routine::new(auth.user_id, &body.name, body.distances.into_vec())?;
    state.store.put_routine(&routine)?;

    tracing::info!(
        user_id = %auth.user_id,
        routine_id = %routine.id,
        stations = routine.stations.len(),
        "Routine created"
    );

    Ok((StatusCode::CREATED, Json(RoutineResponse::from(routine))))
}

/// List the user's routines, oldest first.
pub async fn list_routines(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<RoutineResponse>>, ApiError> {
    let routines = state.store.list_routines_by_user(&auth.user_id)?;
    Ok(Json(routines.into_iter().map(RoutineResponse::from).collect()))
}

/// Get one routine.
pub async fn get_routine(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(routine_id): Path<String>,
) -> Result<Json<RoutineResponse>, ApiError> {
    let routine = load_routine(&state, &auth, &routine_id)?;
    Ok(Json(RoutineResponse::from(routine)))
}

/// Rename or re-station a routine. Recorded sessions are unaffected.
pub async fn update_routine(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(routine_id): Path<String>,
    Json(body): Json<UpdateRoutineRequest>,
) -> Result<Json<RoutineResponse>, ApiError> {
    let mut routine = load_routine(&state, &auth, &routine_id)?;

    if let Some(name) = body.name.as_deref() {
        routine.rename(name)?;
    }
    if let Some(distances) = body.distances {
        routine.set_stations(distances.into_vec())?;
    }

    state.store.put_routine(&routine)?;

    tracing::info!(user_id = %auth.user_id, routine_id = %routine.id, "Routine updated");

    Ok(Json(RoutineResponse::from(routine)))
}

/// Delete a routine. Recorded sessions are kept.
pub async fn delete_routine(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(routine_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let routine_id: RoutineId = parse_id(&routine_id, "routine")?;
    state.store.delete_routine(&auth.user_id, &routine_id)?;

    tracing::info!(user_id = %auth.user_id, routine_id = %routine_id, "Routine deleted");

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Mode query parameter.
#[derive(Debug, Deserialize)]
pub struct ModeQuery {
    /// `individual` or `total`.
    pub mode: Option<String>,
}

impl ModeQuery {
    /// The requested mode; a missing one is rejected.
    fn required(&self) -> Result<SessionMode, PracticeError> {
        self.mode.as_deref().unwrap_or_default().parse()
    }

    /// The requested mode, `total` when absent.
    fn or_total(&self) -> Result<SessionMode, PracticeError> {
        match self.mode.as_deref().map(str::trim) {
            None | Some("") => Ok(SessionMode::Total),
            Some(raw) => raw.parse(),
        }
    }
}

/// Everything needed to run a routine.
#[derive(Debug, Serialize)]
pub struct StartResponse {
    /// The routine to run.
    pub routine: RoutineResponse,
    /// The chosen mode.
    pub mode: SessionMode,
    /// The user's discs, for `individual` runs.
    pub discs: Vec<DiscResponse>,
}

/// Prepare a run of a routine.
pub async fn start_routine(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(routine_id): Path<String>,
    Query(query): Query<ModeQuery>,
) -> Result<Json<StartResponse>, ApiError> {
    let routine = load_routine(&state, &auth, &routine_id)?;
    let mode = query.or_total()?;
    let discs = load_discs(&state, &auth)?;

    Ok(Json(StartResponse {
        routine: RoutineResponse::from(routine),
        mode,
        discs,
    }))
}

/// The recorded session and its effect.
#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    /// The new session, with the accuracy of its own deltas.
    pub session: SessionResponse,
    /// The user's overall accuracy after this session.
    pub stats: StatsSummary,
}

/// Record a completed run from the submitted form.
pub async fn complete_routine(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(routine_id): Path<String>,
    Query(query): Query<ModeQuery>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<(StatusCode, Json<CompletionResponse>), ApiError> {
    let routine = load_routine(&state, &auth, &routine_id)?;
    let mode = query.required()?;

    let owned: BTreeSet<DiscId> = state
        .store
        .list_discs_by_user(&auth.user_id)?
        .into_iter()
        .map(|disc| disc.id)
        .collect();

    let session = state.recorder.record(
        &routine,
        mode,
        &FormFields::new(fields),
        |disc_id| owned.contains(disc_id),
    )?;
    let stats = state.store.record_session(&session)?;

    tracing::info!(
        user_id = %auth.user_id,
        session_id = %session.id,
        routine_id = %routine.id,
        mode = %mode,
        "Session recorded"
    );

    Ok((
        StatusCode::CREATED,
        Json(CompletionResponse {
            session: SessionResponse::from(session),
            stats: stats.summary(),
        }),
    ))
}
