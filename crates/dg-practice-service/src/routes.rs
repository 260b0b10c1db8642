//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    discs, health, home, identity, manufacturers, routines, sessions, stats, users,
};
use crate::state::AppState;

/// Maximum concurrent requests for API endpoints.
///
/// Every mutation serializes on the document lock, so a modest limit keeps
/// queued writers bounded.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `POST /v1/users/register`, `POST /v1/users/login`, `POST /v1/users/logout`
/// - `POST /v1/identity/device` - Issue an anonymous device identity
/// - `GET /v1/manufacturers` - Manufacturer catalog
///
/// ## Per user (token or device identity)
/// - `GET/PATCH /v1/users/me`, `GET /v1/identity`
/// - `GET/POST /v1/discs`, `GET /v1/discs/compare`, `GET/DELETE /v1/discs/:id`
/// - `GET/POST /v1/routines`, `GET/PATCH/DELETE /v1/routines/:id`
/// - `GET /v1/routines/:id/start`, `POST /v1/routines/:id/complete`
/// - `GET /v1/sessions`, `GET/DELETE /v1/sessions/:id`
/// - `GET /v1/stats`, `GET /v1/stats/discs/:id`, `GET /v1/stats/timeline`
/// - `POST /v1/stats/recalculate`, `GET /v1/stats/verify`
/// - `GET /v1/home`, `GET /v1/session/next`
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let api_routes = Router::new()
        // Accounts
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
        .route("/users/logout", post(users::logout))
        .route("/users/me", get(users::get_me).patch(users::update_me))
        // Identity
        .route("/identity", get(identity::whoami))
        .route("/identity/device", post(identity::issue_device))
        // Discs
        .route("/discs", get(discs::list_discs).post(discs::create_disc))
        .route("/discs/compare", get(discs::compare_discs))
        .route("/discs/:id", get(discs::get_disc).delete(discs::delete_disc))
        .route("/manufacturers", get(manufacturers::list_manufacturers))
        // Routines
        .route(
            "/routines",
            get(routines::list_routines).post(routines::create_routine),
        )
        .route(
            "/routines/:id",
            get(routines::get_routine)
                .patch(routines::update_routine)
                .delete(routines::delete_routine),
        )
        .route("/routines/:id/start", get(routines::start_routine))
        .route("/routines/:id/complete", post(routines::complete_routine))
        // Sessions
        .route("/sessions", get(sessions::list_sessions))
        .route(
            "/sessions/:id",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        // Stats
        .route("/stats", get(stats::get_stats))
        .route("/stats/discs/:id", get(stats::get_disc_stats))
        .route("/stats/timeline", get(stats::get_timeline))
        .route("/stats/recalculate", post(stats::recalculate))
        .route("/stats/verify", get(stats::verify))
        // Dashboard
        .route("/home", get(home::home))
        .route("/session/next", get(home::next_session))
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        // API v1 routes (rate limited)
        .nest("/v1", api_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
