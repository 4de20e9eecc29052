//! Persistence seams consumed by the engine.
//!
//! Each trait mirrors one collaborator of the reconciliation pipeline. Both
//! [`PgStore`] (the binary) and [`MemoryStore`] (integration tests) implement
//! all of them; the engine only sees `Arc<dyn EngineStore>`.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::failure::NewFailureRecord;
use crate::models::trade::NewTradeRecord;
use crate::models::{
    FailureRecord, FollowConfig, FollowerPosition, MasterPosition, NewFollowConfig, PositionKey,
    TradeRecord,
};

#[async_trait]
pub trait FollowConfigStore: Send + Sync {
    async fn active_configs(&self) -> anyhow::Result<Vec<FollowConfig>>;

    async fn config_for_follower(&self, follower_user_id: i64) -> anyhow::Result<Option<FollowConfig>>;

    async fn upsert_config(&self, config: &NewFollowConfig) -> anyhow::Result<FollowConfig>;

    /// Returns false when the follower has no config.
    async fn set_config_active(&self, follower_user_id: i64, active: bool) -> anyhow::Result<bool>;
}

#[async_trait]
pub trait PositionStore: Send + Sync {
    async fn upsert_master_position(
        &self,
        master_user_id: i64,
        master_credential_id: i64,
        symbol: &str,
        size: Decimal,
        entry_price: Option<Decimal>,
    ) -> anyhow::Result<MasterPosition>;

    async fn master_positions(
        &self,
        master_user_id: i64,
        master_credential_id: i64,
    ) -> anyhow::Result<Vec<MasterPosition>>;

    async fn master_positions_by_user(&self, master_user_id: i64) -> anyhow::Result<Vec<MasterPosition>>;

    async fn follower_position(
        &self,
        user_id: i64,
        credential_id: i64,
        symbol: &str,
    ) -> anyhow::Result<Option<FollowerPosition>>;

    async fn follower_positions_by_user(&self, user_id: i64) -> anyhow::Result<Vec<FollowerPosition>>;

    async fn upsert_follower_position(
        &self,
        user_id: i64,
        credential_id: i64,
        symbol: &str,
        size: Decimal,
        entry_price: Option<Decimal>,
    ) -> anyhow::Result<FollowerPosition>;
}

/// Append-only record of reconciliation attempts.
#[async_trait]
pub trait TradeLedger: Send + Sync {
    async fn record_pending(&self, trade: &NewTradeRecord) -> anyhow::Result<TradeRecord>;

    async fn mark_filled(
        &self,
        trade_id: Uuid,
        order_id: &str,
        fill_price: Option<Decimal>,
        execution_time_ms: i64,
    ) -> anyhow::Result<()>;

    async fn mark_failed(
        &self,
        trade_id: Uuid,
        error_message: &str,
        execution_time_ms: i64,
    ) -> anyhow::Result<()>;

    async fn trade(&self, trade_id: Uuid) -> anyhow::Result<Option<TradeRecord>>;

    async fn recent_trades(
        &self,
        follower_user_id: Option<i64>,
        limit: i64,
    ) -> anyhow::Result<Vec<TradeRecord>>;
}

#[async_trait]
pub trait FailureRegister: Send + Sync {
    async fn record_failure(&self, failure: &NewFailureRecord) -> anyhow::Result<FailureRecord>;

    async fn has_unresolved(&self, user_id: i64) -> anyhow::Result<bool>;

    async fn unresolved_for_user(&self, user_id: i64) -> anyhow::Result<Vec<FailureRecord>>;

    async fn failures_for_user(&self, user_id: i64, limit: i64) -> anyhow::Result<Vec<FailureRecord>>;

    async fn resolve(&self, failure_id: Uuid, resolved_by: i64) -> anyhow::Result<Option<FailureRecord>>;
}

/// Durable copy of the change detector's "last observed size" map.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn load_snapshot(&self) -> anyhow::Result<Vec<(PositionKey, Decimal)>>;

    async fn save_size(&self, key: &PositionKey, size: Decimal) -> anyhow::Result<()>;
}

/// Everything the engine and the control API need from persistence.
#[async_trait]
pub trait EngineStore:
    FollowConfigStore + PositionStore + TradeLedger + FailureRegister + SnapshotStore
{
    /// Cheap liveness check used by the health endpoint.
    async fn ping(&self) -> anyhow::Result<()>;
}
