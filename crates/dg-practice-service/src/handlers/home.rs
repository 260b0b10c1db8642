//! Dashboard handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::response::Redirect;
use axum::Json;
use serde::Serialize;

use dg_practice_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::routines::RoutineResponse;
use crate::handlers::sessions::SessionResponse;
use crate::state::AppState;

/// Number of sessions shown on the dashboard.
const RECENT_SESSIONS: usize = 5;

/// Headline figures.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    /// Circle 1 accuracy, whole percent.
    pub c1: u32,
    /// Circle 2 accuracy, whole percent.
    pub c2: u32,
    /// Total number of recorded sessions.
    pub sessions_count: usize,
}

/// Dashboard view.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeResponse {
    /// Most recently created routine.
    pub last_routine: Option<RoutineResponse>,
    /// Headline figures.
    pub kpis: Kpis,
    /// Latest sessions, newest first.
    pub recent_sessions: Vec<SessionResponse>,
}

/// Get the dashboard.
pub async fn home(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<HomeResponse>, ApiError> {
    let last_routine = state
        .store
        .list_routines_by_user(&auth.user_id)?
        .pop()
        .map(RoutineResponse::from);

    let summary = state.store.get_user_stats(&auth.user_id)?.summary();
    let sessions = state
        .store
        .list_sessions_by_user(&auth.user_id, RECENT_SESSIONS, 0)?;

    let kpis = Kpis {
        c1: summary.c1.pct,
        c2: summary.c2.pct,
        sessions_count: state.store.count_sessions_by_user(&auth.user_id)?,
    };

    Ok(Json(HomeResponse {
        last_routine,
        kpis,
        recent_sessions: sessions
            .into_iter()
            .map(SessionResponse::from)
            .collect(),
    }))
}

/// Where the "start session" button leads: the last routine's run form, or
/// routine creation when there is none.
pub async fn next_session(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Redirect, ApiError> {
    let last_routine = state.store.list_routines_by_user(&auth.user_id)?.pop();

    let target = match last_routine {
        Some(routine) => format!("/v1/routines/{}/start?mode=total", routine.id),
        None => "/v1/routines".to_string(),
    };

    Ok(Redirect::to(&target))
}
