use axum::extract::{Path, State};
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{FollowerPosition, MasterPosition};
use crate::AppState;

use super::ApiResponse;

#[derive(Deserialize)]
pub struct UpdateMasterPositionRequest {
    pub master_user_id: i64,
    pub master_credential_id: i64,
    pub symbol: String,
    pub size: Decimal,
    pub entry_price: Option<Decimal>,
}

/// PUT /api/master-positions: report the master's current size for a symbol
pub async fn update_master(
    State(state): State<AppState>,
    Json(body): Json<UpdateMasterPositionRequest>,
) -> Result<Json<ApiResponse<MasterPosition>>, AppError> {
    let symbol = body.symbol.trim();
    if symbol.is_empty() {
        return Err(AppError::BadRequest("symbol must not be empty".into()));
    }
    if body.entry_price.is_some_and(|p| p <= Decimal::ZERO) {
        return Err(AppError::BadRequest("entry_price must be positive".into()));
    }

    let position = state
        .engine
        .update_master_position(
            body.master_user_id,
            body.master_credential_id,
            symbol,
            body.size,
            body.entry_price,
        )
        .await?;

    Ok(Json(ApiResponse::ok(position)))
}

/// GET /api/master-positions/{user_id}
pub async fn list_master(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<MasterPosition>>>, AppError> {
    let positions = state.store.master_positions_by_user(user_id).await?;
    Ok(Json(ApiResponse::ok(positions)))
}

/// GET /api/follower-positions/{user_id}
pub async fn list_follower(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<FollowerPosition>>>, AppError> {
    let positions = state.store.follower_positions_by_user(user_id).await?;
    Ok(Json(ApiResponse::ok(positions)))
}
