//! Identity resolution.
//!
//! Every request is made on behalf of one user. The `AuthUser` extractor looks,
//! in order, for:
//!
//! 1. `Authorization: Bearer <token>` - a session token from register/login
//! 2. a `dg_session` cookie holding the same kind of token
//! 3. a `clientId` cookie - an anonymous device identity
//!
//! Handlers only ever see `AuthUser::user_id` and filter every query by it.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use serde::Serialize;

use dg_practice_core::UserId;
use dg_practice_store::Store;

use crate::error::ApiError;
use crate::state::AppState;

/// Cookie carrying a session token.
pub const SESSION_COOKIE: &str = "dg_session";

/// Cookie carrying an anonymous device identity.
pub const DEVICE_COOKIE: &str = "clientId";

/// Lifetime of the device cookie in seconds (one year).
pub const DEVICE_COOKIE_MAX_AGE: u64 = 60 * 60 * 24 * 365;

/// How the requesting user was identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentitySource {
    /// A session token (registered user).
    Token,
    /// An anonymous device cookie.
    Device,
}

/// The user a request is made on behalf of.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    /// The user ID.
    pub user_id: UserId,
    /// How it was resolved.
    pub source: IdentitySource,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        // An explicit bearer token must be valid; it never falls back to cookies.
        if let Some(header) = parts.headers.get(AUTHORIZATION) {
            let token = header
                .to_str()
                .ok()
                .and_then(|v| v.strip_prefix("Bearer "))
                .ok_or(ApiError::Unauthorized)?;
            let user_id = state.tokens.verify(token.trim())?;
            return Ok(Self {
                user_id,
                source: IdentitySource::Token,
            });
        }

        if let Some(token) = cookie_value(&parts.headers, SESSION_COOKIE) {
            match state.tokens.verify(token) {
                Ok(user_id) => {
                    return Ok(Self {
                        user_id,
                        source: IdentitySource::Token,
                    })
                }
                Err(_) => tracing::debug!("Ignoring invalid session cookie"),
            }
        }

        let device_id = cookie_value(&parts.headers, DEVICE_COOKIE)
            .and_then(|raw| raw.parse::<UserId>().ok())
            .ok_or(ApiError::Unauthorized)?;

        // A device cookie cannot impersonate a registered account.
        if state.store.get_user(&device_id)?.is_some() {
            tracing::warn!(user_id = %device_id, "Device cookie names a registered user");
            return Err(ApiError::Unauthorized);
        }

        Ok(Self {
            user_id: device_id,
            source: IdentitySource::Device,
        })
    }
}

/// Value of the first cookie called `name` across all `Cookie` headers.
#[must_use]
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().trim_matches('"'))
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value storing a session token.
#[must_use]
pub fn session_cookie(token: &str, max_age_seconds: i64) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; Max-Age={max_age_seconds}; HttpOnly; SameSite=Lax")
}

/// `Set-Cookie` value clearing the session token.
#[must_use]
pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}

/// `Set-Cookie` value storing a device identity.
#[must_use]
pub fn device_cookie(device_id: &UserId) -> String {
    format!("{DEVICE_COOKIE}={device_id}; Path=/; Max-Age={DEVICE_COOKIE_MAX_AGE}; SameSite=Lax")
}
