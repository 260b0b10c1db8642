//! dg-practice HTTP API service.
//!
//! This crate provides the HTTP API for the practice tracker:
//!
//! - Accounts and anonymous device identities
//! - Disc bag and manufacturer catalog
//! - Routines, running them and the recorded sessions
//! - Circle stats per user and per disc, with rebuild and verification
//!
//! # Authentication
//!
//! Requests are resolved to a user in this order:
//!
//! 1. **Session tokens** - issued at register/login, sent as a Bearer header or
//!    the `dg_session` cookie
//! 2. **Device identities** - an anonymous `clientId` cookie

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers are async for the router even when the store is sync

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use auth::{AuthUser, IdentitySource};
pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
