//! Application state.

use std::sync::Arc;

use chrono::Duration;

use dg_practice_core::SessionRecorder;
use dg_practice_store::JsonStore;

use crate::config::ServiceConfig;
use crate::crypto::TokenKeys;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<JsonStore>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Builds session records from submitted runs.
    pub recorder: SessionRecorder,

    /// Session token keys.
    pub tokens: TokenKeys,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<JsonStore>, config: ServiceConfig) -> Self {
        let recorder = SessionRecorder::new(config.input_policy);
        tracing::info!(input_policy = %config.input_policy, "Session recorder configured");

        let tokens = TokenKeys::new(
            &config.token_secret,
            config.token_issuer.clone(),
            Duration::hours(config.token_ttl_hours),
        );

        Self {
            store,
            config,
            recorder,
            tokens,
        }
    }
}
