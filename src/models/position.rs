use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for master_positions. Size is signed: >0 long, <0 short, 0 flat.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MasterPosition {
    pub id: Uuid,
    pub master_user_id: i64,
    pub master_credential_id: i64,
    pub symbol: String,
    pub size: Decimal,
    pub entry_price: Option<Decimal>,
    pub updated_at: DateTime<Utc>,
}

impl MasterPosition {
    pub fn key(&self) -> PositionKey {
        PositionKey::new(self.master_user_id, self.master_credential_id, &self.symbol)
    }
}

/// Database row for follower_positions.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FollowerPosition {
    pub id: Uuid,
    pub user_id: i64,
    pub credential_id: i64,
    pub symbol: String,
    pub size: Decimal,
    pub entry_price: Option<Decimal>,
    pub updated_at: DateTime<Utc>,
}

/// (owner user, credential, symbol): the unique key of both position tables
/// and of the change detector's state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PositionKey {
    pub user_id: i64,
    pub credential_id: i64,
    pub symbol: String,
}

impl PositionKey {
    pub fn new(user_id: i64, credential_id: i64, symbol: &str) -> Self {
        Self {
            user_id,
            credential_id,
            symbol: symbol.to_string(),
        }
    }
}

impl std::fmt::Display for PositionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.user_id, self.credential_id, self.symbol)
    }
}
