//! Routine and session recording integration tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use dg_practice_core::{DiscId, InputPolicy, RoutineId};
use serde_json::{json, Value};

// ============================================================================
// Routine CRUD
// ============================================================================

#[tokio::test]
async fn create_routine_parses_distance_text() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/routines")
        .add_header("cookie", harness.device_cookie())
        .json(&json!({ "name": "Ladder", "distances": "7, 12,x, 15" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["name"], "Ladder");
    assert_eq!(body["stations"], json!([7.0, 12.0, 15.0]));
    assert_eq!(body["circles"], json!(["circle1", "circle2", "circle2"]));
}

#[tokio::test]
async fn create_routine_accepts_distance_list() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/routines")
        .add_header("cookie", harness.device_cookie())
        .json(&json!({ "name": "Short", "distances": [3, 5.5] }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["stations"], json!([3.0, 5.5]));
}

#[tokio::test]
async fn create_routine_requires_a_station() {
    let harness = TestHarness::new();

    harness
        .server
        .post("/v1/routines")
        .add_header("cookie", harness.device_cookie())
        .json(&json!({ "name": "Empty", "distances": "0, -2" }))
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn update_routine_renames_and_restations() {
    let harness = TestHarness::new();
    let routine_id = harness.create_routine("Ladder", "7,12").await;

    let response = harness
        .server
        .patch(&format!("/v1/routines/{routine_id}"))
        .add_header("cookie", harness.device_cookie())
        .json(&json!({ "name": "Long ladder", "distances": "7,12,18" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["name"], "Long ladder");
    assert_eq!(body["stations"], json!([7.0, 12.0, 18.0]));
}

#[tokio::test]
async fn delete_routine_keeps_sessions() {
    let harness = TestHarness::new();
    let routine_id = harness.create_routine("Ladder", "7").await;

    harness
        .server
        .post(&format!("/v1/routines/{routine_id}/complete?mode=total"))
        .add_header("cookie", harness.device_cookie())
        .form(&[("hits_0", "3"), ("attempts", "5")])
        .await
        .assert_status(StatusCode::CREATED);

    harness
        .server
        .delete(&format!("/v1/routines/{routine_id}"))
        .add_header("cookie", harness.device_cookie())
        .await
        .assert_status_ok();

    let response = harness
        .server
        .get("/v1/sessions")
        .add_header("cookie", harness.device_cookie())
        .await;
    let body: Value = response.json();
    assert_eq!(body["sessions"].as_array().unwrap().len(), 1);
    assert_eq!(body["sessions"][0]["routineName"], "Ladder");
}

#[tokio::test]
async fn missing_routine_redirects_to_listing() {
    let harness = TestHarness::new();

    let missing = RoutineId::generate();

    let response = harness
        .server
        .get(&format!("/v1/routines/{missing}/start"))
        .add_header("cookie", harness.device_cookie())
        .await;

    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["error"]["details"]["redirect"], "/v1/routines");
}

// ============================================================================
// Start / Complete
// ============================================================================

#[tokio::test]
async fn start_defaults_to_total_mode_and_lists_discs() {
    let harness = TestHarness::new();
    let routine_id = harness.create_routine("Ladder", "7,12").await;
    harness.create_disc("Innova", "Aviar").await;

    let response = harness
        .server
        .get(&format!("/v1/routines/{routine_id}/start"))
        .add_header("cookie", harness.device_cookie())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["mode"], "total");
    assert_eq!(body["routine"]["id"], routine_id.as_str());
    assert_eq!(body["discs"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn start_rejects_unknown_mode() {
    let harness = TestHarness::new();
    let routine_id = harness.create_routine("Ladder", "7").await;

    harness
        .server
        .get(&format!("/v1/routines/{routine_id}/start?mode=sideways"))
        .add_header("cookie", harness.device_cookie())
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn total_mode_splits_stations_by_circle() {
    let harness = TestHarness::new();
    let routine_id = harness.create_routine("Ladder", "7,12,15").await;

    let response = harness
        .server
        .post(&format!("/v1/routines/{routine_id}/complete?mode=total"))
        .add_header("cookie", harness.device_cookie())
        .form(&[
            ("hits_0", "5"),
            ("hits_1", "3"),
            ("hits_2", "2"),
            ("attempts", "6"),
        ])
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["session"]["mode"], "total");
    assert_eq!(body["session"]["stations"].as_array().unwrap().len(), 3);
    assert!(body["session"].get("discs").is_none());

    assert_eq!(body["stats"]["c1"], json!({ "h": 5, "a": 6, "pct": 83 }));
    assert_eq!(body["stats"]["c2"], json!({ "h": 5, "a": 12, "pct": 42 }));

    let stats: Value = harness
        .server
        .get("/v1/stats")
        .add_header("cookie", harness.device_cookie())
        .await
        .json();
    assert_eq!(stats["stats"]["circle1"], json!({ "hits": 5, "attempts": 6 }));
    assert_eq!(stats["stats"]["circle2"], json!({ "hits": 5, "attempts": 12 }));
    assert_eq!(stats["sessionsCount"], 1);
}

#[tokio::test]
async fn individual_mode_updates_disc_stats() {
    let harness = TestHarness::new();
    let routine_id = harness.create_routine("Ladder", "7,12").await;
    let disc_id = harness.create_disc("Innova", "Aviar").await;

    // Submitting the same disc twice counts it once.
    let fields = vec![
        ("discIds".to_string(), disc_id.clone()),
        ("discIds".to_string(), disc_id.clone()),
        (format!("attc1_{disc_id}"), "10".to_string()),
        (format!("hitc1_{disc_id}"), "7".to_string()),
        (format!("attc2_{disc_id}"), "5".to_string()),
        (format!("hitc2_{disc_id}"), "3".to_string()),
    ];

    let response = harness
        .server
        .post(&format!("/v1/routines/{routine_id}/complete?mode=individual"))
        .add_header("cookie", harness.device_cookie())
        .form(&fields)
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["session"]["discs"].as_array().unwrap().len(), 1);
    assert!(body["session"].get("stations").is_none());

    let disc: Value = harness
        .server
        .get(&format!("/v1/discs/{disc_id}"))
        .add_header("cookie", harness.device_cookie())
        .await
        .json();
    assert_eq!(disc["stats"]["c1"]["pct"], 70);
    assert_eq!(disc["stats"]["c2"]["pct"], 60);
    assert_eq!(disc["stats"]["total"]["pct"], 67);
}

#[tokio::test]
async fn complete_requires_mode() {
    let harness = TestHarness::new();
    let routine_id = harness.create_routine("Ladder", "7").await;

    let response = harness
        .server
        .post(&format!("/v1/routines/{routine_id}/complete"))
        .add_header("cookie", harness.device_cookie())
        .form(&[("hits_0", "1"), ("attempts", "1")])
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn complete_rejects_foreign_disc() {
    let harness = TestHarness::new();
    let routine_id = harness.create_routine("Ladder", "7").await;
    let foreign = DiscId::generate().to_string();

    harness
        .server
        .post(&format!("/v1/routines/{routine_id}/complete?mode=individual"))
        .add_header("cookie", harness.device_cookie())
        .form(&[("discIds", foreign.as_str())])
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn lenient_input_treats_garbage_as_zero() {
    let harness = TestHarness::new();
    let routine_id = harness.create_routine("Ladder", "7").await;

    let response = harness
        .server
        .post(&format!("/v1/routines/{routine_id}/complete?mode=total"))
        .add_header("cookie", harness.device_cookie())
        .form(&[("hits_0", "lots"), ("attempts", "4.9")])
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["stats"]["c1"], json!({ "h": 0, "a": 4, "pct": 0 }));
}

#[tokio::test]
async fn strict_input_rejects_garbage() {
    let harness = TestHarness::with_policy(InputPolicy::Strict);
    let routine_id = harness.create_routine("Ladder", "7").await;

    harness
        .server
        .post(&format!("/v1/routines/{routine_id}/complete?mode=total"))
        .add_header("cookie", harness.device_cookie())
        .form(&[("hits_0", "lots"), ("attempts", "4")])
        .await
        .assert_status_bad_request();
}
