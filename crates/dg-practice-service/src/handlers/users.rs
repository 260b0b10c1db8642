//! Account handlers: registration, login and profile.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::{AppendHeaders, IntoResponse};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use dg_practice_core::user::{validate_email, validate_password, validate_username};
use dg_practice_core::User;
use dg_practice_store::Store;

use crate::auth::{expired_session_cookie, session_cookie, AuthUser};
use crate::crypto::{hash_password, verify_password};
use crate::error::ApiError;
use crate::state::AppState;

/// Public view of a user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// User ID.
    pub id: String,
    /// Login name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Registration timestamp.
    pub created_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Returned by register and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Session token for the `Authorization` header.
    pub token: String,
    /// The signed-in user.
    pub user: UserResponse,
}

/// Register request.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Login name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Plain-text password.
    pub password: String,
}

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email.
    pub login: String,
    /// Plain-text password.
    pub password: String,
}

/// Profile update request.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    /// New login name.
    pub username: Option<String>,
    /// New email address.
    pub email: Option<String>,
}

fn signed_in(state: &AppState, user: &User) -> Result<impl IntoResponse, ApiError> {
    let token = state.tokens.issue(&user.id)?;
    let cookie = session_cookie(&token, state.tokens.ttl().num_seconds());
    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(AuthResponse {
            token,
            user: UserResponse::from(user),
        }),
    ))
}

/// Register a new user and sign them in.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_password(&body.password)?;
    let password_hash = hash_password(&body.password)?;
    let user = User::new(&body.username, &body.email, password_hash)?;

    state.store.create_user(&user)?;

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    Ok((StatusCode::CREATED, signed_in(&state, &user)?))
}

/// Sign in with username or email.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .store
        .find_user_by_login(&body.login)?
        .filter(|user| verify_password(&body.password, &user.password_hash))
        .ok_or_else(|| {
            tracing::debug!("Login rejected");
            ApiError::Unauthorized
        })?;

    tracing::info!(user_id = %user.id, "User signed in");

    signed_in(&state, &user)
}

/// Clear the session cookie.
pub async fn logout() -> impl IntoResponse {
    (
        AppendHeaders([(SET_COOKIE, expired_session_cookie())]),
        Json(serde_json::json!({ "signedOut": true })),
    )
}

fn registered_user(state: &AppState, auth: &AuthUser) -> Result<User, ApiError> {
    state
        .store
        .get_user(&auth.user_id)?
        .ok_or(ApiError::Unauthorized)
}

/// Get the signed-in user.
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = registered_user(&state, &auth)?;
    Ok(Json(UserResponse::from(&user)))
}

/// Change the signed-in user's username or email.
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let mut user = registered_user(&state, &auth)?;

    if let Some(username) = body.username.as_deref() {
        user.username = validate_username(username)?;
    }
    if let Some(email) = body.email.as_deref() {
        user.email = validate_email(email)?;
    }
    user.updated_at = Utc::now();

    state.store.update_user(&user)?;

    tracing::info!(user_id = %user.id, "Profile updated");

    Ok(Json(UserResponse::from(&user)))
}
