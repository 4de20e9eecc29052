use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for failure_records. An unresolved row suspends the user's copying.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FailureRecord {
    pub id: Uuid,
    pub user_id: i64,
    pub trade_record_id: Option<Uuid>,
    pub error_type: String,
    pub error_message: String,
    pub error_details: Option<serde_json::Value>,
    pub is_resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFailureRecord {
    pub user_id: i64,
    pub trade_record_id: Option<Uuid>,
    pub error_type: String,
    pub error_message: String,
    pub error_details: Option<serde_json::Value>,
}
