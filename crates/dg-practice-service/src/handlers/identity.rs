//! Device identity handlers.

use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::{AppendHeaders, IntoResponse};
use axum::Json;
use serde::Serialize;

use dg_practice_core::UserId;

use crate::auth::{device_cookie, AuthUser, IdentitySource};

/// The identity a request resolved to.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityResponse {
    /// The user the request acts for.
    pub user_id: String,
    /// How it was resolved.
    pub source: IdentitySource,
}

/// Issue a fresh anonymous device identity.
pub async fn issue_device() -> impl IntoResponse {
    let device_id = UserId::generate();

    tracing::info!(user_id = %device_id, "Device identity issued");

    (
        StatusCode::CREATED,
        AppendHeaders([(SET_COOKIE, device_cookie(&device_id))]),
        Json(IdentityResponse {
            user_id: device_id.to_string(),
            source: IdentitySource::Device,
        }),
    )
}

/// Report who the request is made on behalf of.
pub async fn whoami(auth: AuthUser) -> Json<IdentityResponse> {
    Json(IdentityResponse {
        user_id: auth.user_id.to_string(),
        source: auth.source,
    })
}
