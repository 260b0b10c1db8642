//! Common test utilities for dg-practice integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;

use dg_practice_core::{InputPolicy, UserId};
use dg_practice_service::{create_router, AppState, ServiceConfig};
use dg_practice_store::JsonStore;

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Temporary directory for the document (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// An anonymous device identity for requests.
    pub device_id: UserId,
}

impl TestHarness {
    /// Create a new test harness with a fresh document and lenient input.
    pub fn new() -> Self {
        Self::with_policy(InputPolicy::Lenient)
    }

    /// Create a new test harness with the given input policy.
    pub fn with_policy(input_policy: InputPolicy) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let data_file = temp_dir.path().join("db.json");
        let store = JsonStore::open(&data_file).expect("Failed to open store");

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_file: data_file.to_string_lossy().to_string(),
            token_secret: "test-token-secret".into(),
            token_ttl_hours: 1,
            token_issuer: "dg-practice".into(),
            input_policy,
            normalize_on_start: false,
            legacy_owner: None,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        };

        let state = AppState::new(Arc::new(store), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            _temp_dir: temp_dir,
            device_id: UserId::generate(),
        }
    }

    /// Cookie header for the harness device identity.
    pub fn device_cookie(&self) -> String {
        format!("clientId={}", self.device_id)
    }

    /// Cookie header for a different device (for testing isolation).
    pub fn other_device_cookie() -> String {
        format!("clientId={}", UserId::generate())
    }

    /// Register a user and return their `Authorization` header value.
    pub async fn register(&self, username: &str) -> String {
        let response = self
            .server
            .post("/v1/users/register")
            .json(&json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": "correct horse battery"
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);

        let body: Value = response.json();
        format!("Bearer {}", body["token"].as_str().expect("token"))
    }

    /// Create a routine for the harness device and return its ID.
    pub async fn create_routine(&self, name: &str, distances: &str) -> String {
        let response = self
            .server
            .post("/v1/routines")
            .add_header("cookie", self.device_cookie())
            .json(&json!({ "name": name, "distances": distances }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);

        let body: Value = response.json();
        body["id"].as_str().expect("routine id").to_string()
    }

    /// Create a disc for the harness device and return its ID.
    pub async fn create_disc(&self, brand: &str, model: &str) -> String {
        let response = self
            .server
            .post("/v1/discs")
            .add_header("cookie", self.device_cookie())
            .json(&json!({ "brand": brand, "model": model }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);

        let body: Value = response.json();
        body["id"].as_str().expect("disc id").to_string()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
