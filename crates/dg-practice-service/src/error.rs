//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use dg_practice_core::PracticeError;
use dg_practice_store::StoreError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Resource not found for the requesting user.
    #[error("{message}")]
    NotFound {
        /// Human-readable message.
        message: String,
        /// The listing a client should fall back to.
        redirect: &'static str,
    },

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict - resource already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// A not-found error for `entity`, pointing the client at its listing.
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            message: format!("{entity} not found: {id}"),
            redirect: listing_for(entity),
        }
    }
}

/// Where to send a client after a lookup of `entity` failed.
fn listing_for(entity: &str) -> &'static str {
    match entity {
        "disc" => "/v1/discs",
        "routine" => "/v1/routines",
        "session" => "/v1/sessions",
        _ => "/v1/home",
    }
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
            ),
            Self::NotFound { message, redirect } => (
                StatusCode::NOT_FOUND,
                "not_found",
                message.clone(),
                Some(serde_json::json!({ "redirect": redirect })),
            ),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone(), None),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::not_found(entity, id),
            StoreError::Conflict(msg) => Self::Conflict(msg),
            StoreError::Database(msg) | StoreError::Serialization(msg) => Self::Internal(msg),
            err @ StoreError::Io { .. } => Self::Internal(err.to_string()),
        }
    }
}

impl From<PracticeError> for ApiError {
    fn from(err: PracticeError) -> Self {
        match err {
            PracticeError::RoutineNotFound { routine_id } => Self::not_found("routine", routine_id),
            PracticeError::DiscNotFound { disc_id } => Self::not_found("disc", disc_id),
            PracticeError::SessionNotFound { session_id } => Self::not_found("session", session_id),
            err @ (PracticeError::InvalidMode(_)
            | PracticeError::Validation(_)
            | PracticeError::InvalidId(_)) => Self::BadRequest(err.to_string()),
        }
    }
}

impl From<dg_practice_core::ValidationError> for ApiError {
    fn from(err: dg_practice_core::ValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}
