//! Stats and dashboard integration tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::{json, Value};

async fn record_total(harness: &TestHarness, routine_id: &str, hits: &str, attempts: &str) {
    harness
        .server
        .post(&format!("/v1/routines/{routine_id}/complete?mode=total"))
        .add_header("cookie", harness.device_cookie())
        .form(&[("hits_0", hits), ("hits_1", hits), ("attempts", attempts)])
        .await
        .assert_status(StatusCode::CREATED);
}

#[tokio::test]
async fn empty_stats_are_zero() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/v1/stats")
        .add_header("cookie", harness.device_cookie())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["summary"]["c1"], json!({ "h": 0, "a": 0, "pct": 0 }));
    assert_eq!(body["sessionsCount"], 0);
}

#[tokio::test]
async fn stats_fold_over_sessions() {
    let harness = TestHarness::new();
    let routine_id = harness.create_routine("Mixed", "8,20").await;
    record_total(&harness, &routine_id, "1", "3").await;
    record_total(&harness, &routine_id, "1", "3").await;

    let body: Value = harness
        .server
        .get("/v1/stats")
        .add_header("cookie", harness.device_cookie())
        .await
        .json();

    assert_eq!(body["summary"]["c1"], json!({ "h": 2, "a": 6, "pct": 33 }));
    assert_eq!(body["summary"]["c2"], json!({ "h": 2, "a": 6, "pct": 33 }));
    assert_eq!(body["summary"]["total"], json!({ "h": 4, "a": 12, "pct": 33 }));
    assert_eq!(body["sessionsCount"], 2);
}

#[tokio::test]
async fn disc_stats_for_unknown_disc_is_not_found() {
    let harness = TestHarness::new();

    harness
        .server
        .get(&format!(
            "/v1/stats/discs/{}",
            dg_practice_core::DiscId::generate()
        ))
        .add_header("cookie", harness.device_cookie())
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn disc_stats_start_at_zero() {
    let harness = TestHarness::new();
    let disc_id = harness.create_disc("MVP", "Atom").await;

    let response = harness
        .server
        .get(&format!("/v1/stats/discs/{disc_id}"))
        .add_header("cookie", harness.device_cookie())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["discId"], disc_id.as_str());
    assert_eq!(body["summary"]["total"]["pct"], 0);
}

#[tokio::test]
async fn timeline_groups_sessions_by_day() {
    let harness = TestHarness::new();
    let routine_id = harness.create_routine("Mixed", "8,20").await;
    record_total(&harness, &routine_id, "2", "4").await;
    record_total(&harness, &routine_id, "4", "4").await;

    let response = harness
        .server
        .get("/v1/stats/timeline")
        .add_header("cookie", harness.device_cookie())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let days = body["days"].as_array().unwrap();
    assert!(!days.is_empty());

    // Both sessions land on today unless the test straddles midnight UTC.
    let sessions: u64 = days.iter().map(|d| d["sessions"].as_u64().unwrap()).sum();
    let c1_hits: u64 = days
        .iter()
        .map(|d| d["stats"]["circle1"]["hits"].as_u64().unwrap())
        .sum();
    assert_eq!(sessions, 2);
    assert_eq!(c1_hits, 6);
}

#[tokio::test]
async fn verify_and_recalculate_agree_on_fresh_data() {
    let harness = TestHarness::new();
    let routine_id = harness.create_routine("Mixed", "8,20").await;
    record_total(&harness, &routine_id, "2", "4").await;

    let verify: Value = harness
        .server
        .get("/v1/stats/verify")
        .add_header("cookie", harness.device_cookie())
        .await
        .json();
    assert_eq!(verify["consistent"], true);

    let response = harness
        .server
        .post("/v1/stats/recalculate")
        .add_header("cookie", harness.device_cookie())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["changed"], false);
    assert_eq!(body["stats"]["circle1"], json!({ "hits": 2, "attempts": 4 }));
}

// ============================================================================
// Dashboard
// ============================================================================

#[tokio::test]
async fn home_shows_last_routine_and_kpis() {
    let harness = TestHarness::new();
    harness.create_routine("First", "5").await;
    let routine_id = harness.create_routine("Second", "8,20").await;
    for _ in 0..6 {
        record_total(&harness, &routine_id, "1", "2").await;
    }

    let response = harness
        .server
        .get("/v1/home")
        .add_header("cookie", harness.device_cookie())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["lastRoutine"]["name"], "Second");
    assert_eq!(body["kpis"], json!({ "c1": 50, "c2": 50, "sessionsCount": 6 }));
    assert_eq!(body["recentSessions"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn next_session_redirects_to_last_routine() {
    let harness = TestHarness::new();
    let routine_id = harness.create_routine("Ladder", "7").await;

    let response = harness
        .server
        .get("/v1/session/next")
        .add_header("cookie", harness.device_cookie())
        .await;

    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(
        response.header("location"),
        format!("/v1/routines/{routine_id}/start?mode=total").as_str()
    );
}

#[tokio::test]
async fn next_session_without_routines_points_at_creation() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/v1/session/next")
        .add_header("cookie", harness.device_cookie())
        .await;

    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), "/v1/routines");
}
