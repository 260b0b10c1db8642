//! Account and identity integration tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::{json, Value};

// ============================================================================
// Register / Login
// ============================================================================

#[tokio::test]
async fn register_returns_token_and_session_cookie() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/users/register")
        .json(&json!({
            "username": "Alex",
            "email": "alex@example.com",
            "password": "correct horse battery"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let cookie = response.header("set-cookie");
    assert!(cookie.to_str().unwrap().starts_with("dg_session="));

    let body: Value = response.json();
    assert!(body["token"].as_str().is_some());
    assert_eq!(body["user"]["username"], "Alex");
    assert!(body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn register_rejects_duplicate_username_case_insensitively() {
    let harness = TestHarness::new();
    harness.register("alex").await;

    let response = harness
        .server
        .post("/v1/users/register")
        .json(&json!({
            "username": "ALEX",
            "email": "other@example.com",
            "password": "correct horse battery"
        }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "conflict");
}

#[tokio::test]
async fn register_validates_input() {
    let harness = TestHarness::new();

    for body in [
        json!({ "username": " ", "email": "a@example.com", "password": "long enough" }),
        json!({ "username": "alex", "email": "not-an-email", "password": "long enough" }),
        json!({ "username": "alex", "email": "a@example.com", "password": "short" }),
    ] {
        harness
            .server
            .post("/v1/users/register")
            .json(&body)
            .await
            .assert_status_bad_request();
    }
}

#[tokio::test]
async fn login_accepts_username_or_email() {
    let harness = TestHarness::new();
    harness.register("sam").await;

    for login in ["sam", "SAM@example.com"] {
        let response = harness
            .server
            .post("/v1/users/login")
            .json(&json!({ "login": login, "password": "correct horse battery" }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["user"]["username"], "sam");
    }
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let harness = TestHarness::new();
    harness.register("sam").await;

    harness
        .server
        .post("/v1/users/login")
        .json(&json!({ "login": "sam", "password": "wrong password" }))
        .await
        .assert_status_unauthorized();
}

// ============================================================================
// Profile
// ============================================================================

#[tokio::test]
async fn get_me_with_bearer_token() {
    let harness = TestHarness::new();
    let auth = harness.register("robin").await;

    let response = harness
        .server
        .get("/v1/users/me")
        .add_header("authorization", auth)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["username"], "robin");
    assert_eq!(body["email"], "robin@example.com");
}

#[tokio::test]
async fn get_me_with_session_cookie() {
    let harness = TestHarness::new();
    let auth = harness.register("robin").await;
    let token = auth.trim_start_matches("Bearer ");

    harness
        .server
        .get("/v1/users/me")
        .add_header("cookie", format!("dg_session={token}"))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn get_me_requires_registered_user() {
    let harness = TestHarness::new();

    harness
        .server
        .get("/v1/users/me")
        .add_header("cookie", harness.device_cookie())
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn update_me_changes_email() {
    let harness = TestHarness::new();
    let auth = harness.register("robin").await;

    let response = harness
        .server
        .patch("/v1/users/me")
        .add_header("authorization", auth)
        .json(&json!({ "email": "robin@disc.example" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["email"], "robin@disc.example");
}

#[tokio::test]
async fn invalid_bearer_token_is_rejected() {
    let harness = TestHarness::new();

    harness
        .server
        .get("/v1/discs")
        .add_header("authorization", "Bearer not-a-token".to_string())
        .add_header("cookie", harness.device_cookie())
        .await
        .assert_status_unauthorized();
}

// ============================================================================
// Device identity
// ============================================================================

#[tokio::test]
async fn issue_device_sets_client_cookie() {
    let harness = TestHarness::new();

    let response = harness.server.post("/v1/identity/device").await;

    response.assert_status(StatusCode::CREATED);
    let cookie = response.header("set-cookie");
    let cookie = cookie.to_str().unwrap();
    assert!(cookie.starts_with("clientId="));
    assert!(cookie.contains("Max-Age=31536000"));

    let body: Value = response.json();
    assert_eq!(body["source"], "device");
}

#[tokio::test]
async fn whoami_reports_device_identity() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/v1/identity")
        .add_header("cookie", harness.device_cookie())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["userId"], harness.device_id.to_string());
    assert_eq!(body["source"], "device");
}

#[tokio::test]
async fn requests_without_identity_are_unauthorized() {
    let harness = TestHarness::new();

    let response = harness.server.get("/v1/routines").await;

    response.assert_status_unauthorized();
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "unauthorized");
}

#[tokio::test]
async fn device_cookie_cannot_name_registered_user() {
    let harness = TestHarness::new();
    let auth = harness.register("casey").await;

    let me: Value = harness
        .server
        .get("/v1/users/me")
        .add_header("authorization", auth)
        .await
        .json();
    let user_id = me["id"].as_str().unwrap();

    harness
        .server
        .get("/v1/discs")
        .add_header("cookie", format!("clientId={user_id}"))
        .await
        .assert_status_unauthorized();
}
