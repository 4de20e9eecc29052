use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for trade_records. One row per reconciliation attempt.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TradeRecord {
    pub id: Uuid,
    pub follow_config_id: Uuid,
    pub follower_user_id: i64,
    pub follower_credential_id: i64,
    pub master_user_id: i64,
    pub master_credential_id: i64,
    pub symbol: String,
    pub side: String,
    pub order_type: String,
    pub action: String,
    pub amount: Decimal,
    pub copy_ratio: Decimal,
    pub estimated_slippage: Decimal,
    pub master_size: Decimal,
    pub master_entry_price: Option<Decimal>,
    pub follower_size_before: Option<Decimal>,
    pub target_size: Option<Decimal>,
    pub order_id: Option<String>,
    pub fill_price: Option<Decimal>,
    pub status: String,
    pub error_message: Option<String>,
    pub execution_time_ms: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub executed_at: Option<DateTime<Utc>>,
}

/// Fields known before execution; the ledger fills in id, status and timestamps.
#[derive(Debug, Clone)]
pub struct NewTradeRecord {
    pub follow_config_id: Uuid,
    pub follower_user_id: i64,
    pub follower_credential_id: i64,
    pub master_user_id: i64,
    pub master_credential_id: i64,
    pub symbol: String,
    pub side: String,
    pub order_type: String,
    pub action: String,
    pub amount: Decimal,
    pub copy_ratio: Decimal,
    pub estimated_slippage: Decimal,
    pub master_size: Decimal,
    pub master_entry_price: Option<Decimal>,
    pub follower_size_before: Option<Decimal>,
    pub target_size: Option<Decimal>,
}

/// Trade status constants.
pub mod trade_status {
    pub const PENDING: &str = "pending";
    pub const FILLED: &str = "filled";
    pub const FAILED: &str = "failed";
}

/// Trade action constants.
pub mod trade_action {
    pub const INCREASE: &str = "increase";
    pub const REDUCE: &str = "reduce";
    pub const MIRROR: &str = "mirror";
}
