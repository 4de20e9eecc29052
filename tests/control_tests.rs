mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{api_key, Harness};
use copybot::api::router::create_router;
use copybot::config::AppConfig;
use copybot::engine::DetectorMode;
use copybot::store::{EngineStore, FailureRegister, FollowConfigStore};
use copybot::AppState;

fn test_config(api_token: &str) -> AppConfig {
    AppConfig {
        database_url: "postgres://localhost/copybot_test".into(),
        host: "127.0.0.1".into(),
        port: 0,
        poll_interval_secs: 3,
        detector_mode: DetectorMode::InMemory,
        engine_autostart: false,
        telegram_bot_token: None,
        telegram_chat_id: None,
        notifications_enabled: false,
        api_token: api_token.into(),
    }
}

fn build_test_app(h: &Harness, api_token: &str) -> axum::Router {
    let store: Arc<dyn EngineStore> = h.store.clone();
    let state = AppState {
        store,
        engine: h.engine.clone(),
        config: test_config(api_token),
        metrics_handle: copybot::metrics::detached_handle(),
    };
    create_router(state)
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_engine_start_stop_status() {
    let h = Harness::new(&[]);
    let app = build_test_app(&h, "");

    let (status, json) = send(&app, "GET", "/api/engine/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["running"], false);
    assert_eq!(json["poll_interval_seconds"], 3);
    assert_eq!(json["detector_mode"], "memory");

    let (status, json) = send(&app, "POST", "/api/engine/start", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "running");
    assert_eq!(json["changed"], true);

    let (_, json) = send(&app, "POST", "/api/engine/start", None).await;
    assert_eq!(json["changed"], false);

    let (_, json) = send(&app, "GET", "/api/engine/status", None).await;
    assert_eq!(json["running"], true);

    let (status, json) = send(&app, "POST", "/api/engine/stop", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "stopped");
    assert_eq!(json["changed"], true);

    let (_, json) = send(&app, "GET", "/api/engine/status", None).await;
    assert_eq!(json["running"], false);
}

#[tokio::test]
async fn test_health() {
    let h = Harness::new(&[]);
    let app = build_test_app(&h, "");

    let (status, json) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["engine_running"], false);
}

#[tokio::test]
async fn test_master_position_update_and_list() {
    let h = Harness::new(&[]);
    let app = build_test_app(&h, "");

    let (status, json) = send(
        &app,
        "PUT",
        "/api/master-positions",
        Some(json!({
            "master_user_id": 1,
            "master_credential_id": 10,
            "symbol": "ETH/USDT",
            "size": "-1.5",
            "entry_price": "3000"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["symbol"], "ETH/USDT");

    let (status, json) = send(&app, "GET", "/api/master-positions/1", None).await;
    assert_eq!(status, StatusCode::OK);
    let positions = json["data"].as_array().unwrap();
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0]["size"], "-1.5");

    let (status, _) = send(
        &app,
        "PUT",
        "/api/master-positions",
        Some(json!({
            "master_user_id": 1,
            "master_credential_id": 10,
            "symbol": "  ",
            "size": "1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_follow_config_upsert_and_get() {
    let h = Harness::new(&[]);
    let app = build_test_app(&h, "");

    let (status, json) = send(
        &app,
        "PUT",
        "/api/follow-configs",
        Some(json!({
            "follower_user_id": 2,
            "master_user_id": 1,
            "master_credential_id": 10,
            "follower_credential_id": 20,
            "copy_ratio": "0.25",
            "copy_mode": "mirror"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["copy_mode"], "mirror");
    assert_eq!(json["data"]["is_active"], true);

    let (status, json) = send(&app, "GET", "/api/follow-configs/2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["copy_ratio"], "0.25");

    let (status, json) = send(&app, "GET", "/api/follow-configs/3", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);

    let (status, _) = send(
        &app,
        "PUT",
        "/api/follow-configs",
        Some(json!({
            "follower_user_id": 2,
            "master_user_id": 1,
            "master_credential_id": 10,
            "follower_credential_id": 20,
            "copy_ratio": "0"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_resolve_endpoint_reactivates_follower() {
    let h = Harness::new(&[2]);
    h.follow(2, dec!(1)).await;
    h.connectors.reject_key(&api_key(2));
    h.set_master("BTC/USDT", dec!(1)).await;
    h.engine.run_tick().await.unwrap();
    assert!(h.store.active_configs().await.unwrap().is_empty());

    let app = build_test_app(&h, "");

    let (status, json) = send(&app, "GET", "/api/failures/2?unresolved=true", None).await;
    assert_eq!(status, StatusCode::OK);
    let failures = json["data"].as_array().unwrap();
    assert_eq!(failures.len(), 1);
    let failure_id = failures[0]["id"].as_str().unwrap().to_string();

    let (status, json) = send(&app, "GET", "/api/trades?limit=5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"][0]["status"], "failed");

    // Re-enabling by hand is refused while the failure is open.
    let (status, _) = send(
        &app,
        "PUT",
        "/api/follow-configs",
        Some(json!({
            "follower_user_id": 2,
            "master_user_id": 1,
            "master_credential_id": 10,
            "follower_credential_id": 20,
            "copy_ratio": "1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let uri = format!("/api/failures/{failure_id}/resolve");
    let (status, json) = send(&app, "POST", &uri, Some(json!({ "resolved_by": 99 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["reactivated"], true);
    assert_eq!(json["data"]["failure"]["is_resolved"], true);

    assert!(!h.store.has_unresolved(2).await.unwrap());
    assert_eq!(h.store.active_configs().await.unwrap().len(), 1);

    let unknown = format!("/api/failures/{}/resolve", uuid::Uuid::new_v4());
    let (status, _) = send(&app, "POST", &unknown, Some(json!({ "resolved_by": 99 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_api_token_required_when_configured() {
    let h = Harness::new(&[]);
    let app = build_test_app(&h, "s3cret");

    let (status, _) = send(&app, "GET", "/api/engine/status", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/api/engine/status")
        .header("authorization", "Bearer s3cret")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Health stays public.
    let (status, _) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}
