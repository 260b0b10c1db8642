//! Stats handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use dg_practice_core::{daily_timeline, CircleStats, DailyStats, DiscId, StatsSummary};
use dg_practice_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::state::AppState;

/// Cached aggregate counters with accuracy figures.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    /// Raw counters.
    pub stats: CircleStats,
    /// Accuracy per circle and overall.
    pub summary: StatsSummary,
    /// Number of recorded sessions.
    pub sessions_count: usize,
}

/// Get the user's overall stats.
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state.store.get_user_stats(&auth.user_id)?;
    let sessions_count = state.store.count_sessions_by_user(&auth.user_id)?;

    Ok(Json(StatsResponse {
        summary: stats.summary(),
        stats,
        sessions_count,
    }))
}

/// Stats of a single disc.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscStatsResponse {
    /// The disc.
    pub disc_id: DiscId,
    /// Raw counters.
    pub stats: CircleStats,
    /// Accuracy per circle and overall.
    pub summary: StatsSummary,
}

/// Get one disc's stats.
pub async fn get_disc_stats(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(disc_id): Path<String>,
) -> Result<Json<DiscStatsResponse>, ApiError> {
    let disc_id: DiscId = parse_id(&disc_id, "disc")?;
    let stats = state
        .store
        .get_disc_stats(&auth.user_id, &disc_id)?
        .ok_or_else(|| ApiError::not_found("disc", disc_id))?;

    Ok(Json(DiscStatsResponse {
        disc_id,
        summary: stats.summary(),
        stats,
    }))
}

/// Per-day progress.
#[derive(Debug, Serialize)]
pub struct TimelineResponse {
    /// One entry per day with sessions, oldest first.
    pub days: Vec<DailyStats>,
}

/// Get the user's accuracy per day.
pub async fn get_timeline(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<TimelineResponse>, ApiError> {
    let sessions = state
        .store
        .list_sessions_by_user(&auth.user_id, usize::MAX, 0)?;

    Ok(Json(TimelineResponse {
        days: daily_timeline(&sessions),
    }))
}

/// Result of a recalculation.
#[derive(Debug, Serialize)]
pub struct RecalculateResponse {
    /// Whether the cached stats differed from the rebuilt ones.
    pub changed: bool,
    /// The rebuilt overall stats.
    pub stats: CircleStats,
    /// Accuracy of the rebuilt stats.
    pub summary: StatsSummary,
}

/// Rebuild the user's stats from their sessions.
pub async fn recalculate(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<RecalculateResponse>, ApiError> {
    let changed = !state.store.verify_stats(&auth.user_id)?;
    let aggregates = state.store.rebuild_stats(&auth.user_id)?;

    if changed {
        tracing::warn!(user_id = %auth.user_id, "Cached stats drifted from sessions; rebuilt");
    } else {
        tracing::info!(user_id = %auth.user_id, "Stats recalculated");
    }

    Ok(Json(RecalculateResponse {
        changed,
        summary: aggregates.user.summary(),
        stats: aggregates.user,
    }))
}

/// Consistency check result.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    /// Whether the cached stats equal a rebuild from sessions.
    pub consistent: bool,
}

/// Check the user's cached stats against their sessions.
pub async fn verify(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<VerifyResponse>, ApiError> {
    let consistent = state.store.verify_stats(&auth.user_id)?;
    Ok(Json(VerifyResponse { consistent }))
}
