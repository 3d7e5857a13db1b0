//! Integration tests for the web API.
//!
//! These tests drive the Axum router directly with `oneshot` requests.

#![cfg(feature = "web")]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use rs_aluprof::hal::{MockClock, MockDriver};
use rs_aluprof::services::{
    build_router, BatchResponse, HealthResponse, PressResponse, SyncResponse, WebServerConfig,
};
use rs_aluprof::{Button, RemoteConfig, RemoteController};

type Remote = RemoteController<MockDriver, MockClock>;

fn create_test_app() -> (axum::Router, Arc<Remote>, MockDriver) {
    let driver = MockDriver::new();
    let remote = Arc::new(RemoteController::new(
        RemoteConfig::default(),
        driver.clone(),
        MockClock::new(),
    ));
    let router = build_router(Arc::clone(&remote), &WebServerConfig::default());
    (router, remote, driver)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_get_state() {
    let (app, _, _) = create_test_app();

    let (status, json) = send(app, get("/state")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["current_value"], 0);
    assert_eq!(json["max_value"], 15);
    assert_eq!(json["sleep_zone"], "unknown");
    assert_eq!(json["is_device_asleep"], Value::Null);
}

#[tokio::test]
async fn test_health() {
    let (app, _, _) = create_test_app();

    let (status, json) = send(app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    let health: HealthResponse = serde_json::from_value(json).unwrap();
    assert_eq!(health, HealthResponse::default());
}

#[tokio::test]
async fn test_sync() {
    let (app, remote, driver) = create_test_app();

    let (status, json) = send(app.clone(), post("/sync", r#"{"value": 12}"#)).await;
    assert_eq!(status, StatusCode::OK);
    let sync: SyncResponse = serde_json::from_value(json).unwrap();
    assert_eq!(sync, SyncResponse::synchronized(12));
    assert_eq!(remote.channels().get(), 12);

    let (_, json) = send(app, get("/state")).await;
    assert_eq!(json["current_value"], 12);
    assert!(driver.events().is_empty());
}

#[tokio::test]
async fn test_sync_rejects_bad_values() {
    let (app, remote, _) = create_test_app();

    for body in [r#"{"value": 16}"#, r#"{"value": -1}"#, r#"{"value": "3"}"#, "{}"] {
        let (status, json) = send(app.clone(), post("/sync", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert!(json["error"].is_string());
    }
    assert_eq!(remote.channels().get(), 0);
}

#[tokio::test]
async fn test_actions_batch() {
    let (app, remote, driver) = create_test_app();

    let body = r#"[
        {"nr": 2, "action": "UP"},
        {"nr": 2, "action": "DELAY", "duration": 1.5},
        {"nr": 99, "action": "STOP"},
        {"nr": 15, "action": "down"}
    ]"#;
    let (status, json) = send(app, post("/actions", body)).await;

    assert_eq!(status, StatusCode::OK);
    let batch: BatchResponse = serde_json::from_value(json.clone()).unwrap();
    assert_eq!(batch.status, "batch_completed");
    assert_eq!(batch.current_state, 15);
    assert_eq!(batch.results.len(), 4);

    assert_eq!(json["results"][0]["type"], "sequenced_command");
    assert_eq!(json["results"][1]["type"], "delay_command");
    assert_eq!(json["results"][2]["type"], "error");
    assert_eq!(json["results"][3]["goto_details"]["direction"], "DECREASE");

    assert_eq!(remote.channels().get(), 15);
    assert_eq!(driver.presses().last(), Some(&Button::GoDown));
}

#[tokio::test]
async fn test_actions_requires_array() {
    let (app, _, driver) = create_test_app();

    let (status, json) = send(app.clone(), post("/actions", r#"{"nr": 1, "action": "UP"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Request body must be a JSON array of actions.");

    let (status, _) = send(app, post("/actions", "not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(driver.events().is_empty());
}

#[tokio::test]
async fn test_press() {
    let (app, remote, driver) = create_test_app();
    remote.sleep().touch(0);

    let (status, json) = send(app, post("/press/increase", "")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["button"], "INCREASE");
    let press: PressResponse = serde_json::from_value(json).unwrap();
    assert_eq!(press, PressResponse::pressed(Button::Increase, 1));
    assert_eq!(driver.presses(), vec![Button::Increase]);
}

#[tokio::test]
async fn test_press_unknown_button() {
    let (app, _, driver) = create_test_app();

    let (status, json) = send(app, post("/press/sideways", "")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("sideways"));
    assert!(driver.events().is_empty());
}

#[tokio::test]
async fn test_press_driver_failure() {
    let (app, remote, driver) = create_test_app();
    remote.sleep().touch(0);
    driver.fail_on(Some(Button::Stop));

    let (status, json) = send(app, post("/press/stop", "")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().contains("STOP"));
}

#[tokio::test]
async fn test_reset() {
    let (app, remote, driver) = create_test_app();
    remote.sync(9).unwrap();

    let (status, json) = send(app.clone(), post("/reset", "")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "reset");
    assert_eq!(json["current_value"], 9);
    for button in Button::ALL {
        assert!(!driver.is_pressed(button));
    }

    let (_, json) = send(app, get("/state")).await;
    assert_eq!(json["sleep_zone"], "unknown");
}

#[tokio::test]
async fn test_reset_failure_reports_channel() {
    let (app, remote, driver) = create_test_app();
    remote.sync(3).unwrap();
    driver.fail_on(Some(Button::GoDown));

    let (status, json) = send(app, post("/reset", "")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].is_string());
    assert_eq!(json["current_value"], 3);
}

#[tokio::test]
async fn test_not_found() {
    let (app, _, _) = create_test_app();

    let (status, json) = send(app, get("/api/state")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Not found");
}
