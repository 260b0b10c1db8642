//! Session history handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use dg_practice_core::{ClampEvent, Session, SessionId, StatsSummary};
use dg_practice_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::state::AppState;

/// Default page size for session listings.
const DEFAULT_LIMIT: usize = 50;

/// Largest accepted page size.
const MAX_LIMIT: usize = 500;

/// A recorded session with the accuracy of its own deltas.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// The session record.
    #[serde(flatten)]
    pub session: Session,
    /// Accuracy figures of this session alone.
    pub summary: StatsSummary,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            summary: session.deltas().summary(),
            session,
        }
    }
}

/// Paging parameters.
#[derive(Debug, Deserialize)]
pub struct ListSessionsQuery {
    /// Page size (default 50, at most 500).
    pub limit: Option<usize>,
    /// Number of sessions to skip.
    pub offset: Option<usize>,
}

/// A page of sessions.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionListResponse {
    /// Sessions, newest first.
    pub sessions: Vec<SessionResponse>,
    /// Whether a further page may exist.
    pub has_more: bool,
}

/// List the user's sessions, newest first.
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ListSessionsQuery>,
) -> Result<Json<SessionListResponse>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let offset = query.offset.unwrap_or(0);

    let sessions = state
        .store
        .list_sessions_by_user(&auth.user_id, limit, offset)?;
    let has_more = limit > 0 && sessions.len() == limit;

    Ok(Json(SessionListResponse {
        sessions: sessions.into_iter().map(SessionResponse::from).collect(),
        has_more,
    }))
}

/// Get one session.
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session_id: SessionId = parse_id(&session_id, "session")?;
    let session = state
        .store
        .get_session(&auth.user_id, &session_id)?
        .ok_or_else(|| ApiError::not_found("session", session_id))?;

    Ok(Json(SessionResponse::from(session)))
}

/// Result of deleting a session.
#[derive(Debug, Serialize)]
pub struct DeleteSessionResponse {
    /// Always true.
    pub deleted: bool,
    /// Whether the cached stats were lower than the session's deltas.
    pub inconsistent: bool,
    /// The counters that had to be clamped at zero.
    pub clamped: Vec<ClampEvent>,
}

/// Delete a session and roll back its deltas.
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<DeleteSessionResponse>, ApiError> {
    let session_id: SessionId = parse_id(&session_id, "session")?;
    let report = state.store.delete_session(&auth.user_id, &session_id)?;

    tracing::info!(
        user_id = %auth.user_id,
        session_id = %session_id,
        consistent = report.is_consistent(),
        "Session deleted"
    );

    Ok(Json(DeleteSessionResponse {
        deleted: true,
        inconsistent: !report.is_consistent(),
        clamped: report.clamped,
    }))
}
