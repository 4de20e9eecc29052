use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::AppState;

/// POST /api/engine/start: Start the monitoring loop.
pub async fn start(State(state): State<AppState>) -> impl IntoResponse {
    let started = state.engine.start().await;
    if started {
        tracing::info!("Follower engine STARTED via control API");
    }
    let status = state.engine.status().await;

    (
        StatusCode::OK,
        Json(json!({
            "status": "running",
            "changed": started,
            "poll_interval_seconds": status.poll_interval_seconds,
        })),
    )
}

/// POST /api/engine/stop: Stop the loop after the current tick.
pub async fn stop(State(state): State<AppState>) -> impl IntoResponse {
    let stopped = state.engine.stop().await;
    if stopped {
        tracing::warn!("Follower engine STOPPED via control API");
    }

    (
        StatusCode::OK,
        Json(json!({ "status": "stopped", "changed": stopped })),
    )
}

/// GET /api/engine/status
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.engine.status().await;

    Json(json!({
        "running": status.running,
        "poll_interval_seconds": status.poll_interval_seconds,
        "detector_mode": state.config.detector_mode.as_str(),
    }))
}
