use axum::extract::{Path, State};
use axum::Json;
use rust_decimal::Decimal;

use crate::errors::AppError;
use crate::models::{FollowConfig, NewFollowConfig};
use crate::AppState;

use super::ApiResponse;

/// GET /api/follow-configs/{user_id}: the follower's config
pub async fn get_config(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<FollowConfig>>, AppError> {
    let config = state
        .store
        .config_for_follower(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("follow config not found".into()))?;

    Ok(Json(ApiResponse::ok(config)))
}

/// PUT /api/follow-configs: create or replace the follower's config
pub async fn upsert(
    State(state): State<AppState>,
    Json(body): Json<NewFollowConfig>,
) -> Result<Json<ApiResponse<FollowConfig>>, AppError> {
    if body.copy_ratio <= Decimal::ZERO {
        return Err(AppError::BadRequest("copy_ratio must be positive".into()));
    }
    if body.follower_user_id == body.master_user_id {
        return Err(AppError::BadRequest("a user cannot follow themselves".into()));
    }

    // Reactivating while failures are open would bypass suspension.
    if body.is_active && state.store.has_unresolved(body.follower_user_id).await? {
        return Err(AppError::Conflict(
            "follower has unresolved failures; resolve them first".into(),
        ));
    }

    let config = state.store.upsert_config(&body).await?;
    tracing::info!(
        follower = config.follower_user_id,
        master = config.master_user_id,
        ratio = %config.copy_ratio,
        mode = %config.copy_mode,
        "Follow config saved"
    );

    Ok(Json(ApiResponse::ok(config)))
}
