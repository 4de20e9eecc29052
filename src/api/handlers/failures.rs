use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::Resolution;
use crate::errors::AppError;
use crate::models::FailureRecord;
use crate::AppState;

use super::ApiResponse;

#[derive(Deserialize)]
pub struct FailureQuery {
    #[serde(default)]
    pub unresolved: bool,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct ResolveRequest {
    pub resolved_by: i64,
}

/// GET /api/failures/{user_id}: newest first; `?unresolved=true` for open ones only
pub async fn list(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(query): Query<FailureQuery>,
) -> Result<Json<ApiResponse<Vec<FailureRecord>>>, AppError> {
    let failures = if query.unresolved {
        state.store.unresolved_for_user(user_id).await?
    } else {
        let limit = query.limit.unwrap_or(100).clamp(1, 500);
        state.store.failures_for_user(user_id, limit).await?
    };

    Ok(Json(ApiResponse::ok(failures)))
}

/// POST /api/failures/{id}/resolve: resolve and, if it was the last one, resume copying
pub async fn resolve(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ResolveRequest>,
) -> Result<Json<ApiResponse<Resolution>>, AppError> {
    let resolution = state
        .engine
        .resolve_failure(id, body.resolved_by)
        .await?
        .ok_or_else(|| AppError::NotFound("failure not found".into()))?;

    Ok(Json(ApiResponse::ok(resolution)))
}
