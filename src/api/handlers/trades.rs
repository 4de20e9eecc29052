use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::TradeRecord;
use crate::AppState;

use super::ApiResponse;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 500;

#[derive(Deserialize)]
pub struct TradeQuery {
    pub limit: Option<i64>,
    pub follower_user_id: Option<i64>,
}

/// GET /api/trades: most recent ledger entries, newest first
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<TradeQuery>,
) -> Result<Json<ApiResponse<Vec<TradeRecord>>>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let trades = state.store.recent_trades(query.follower_user_id, limit).await?;
    Ok(Json(ApiResponse::ok(trades)))
}
