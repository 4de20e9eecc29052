use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{failure_repo, follow_config_repo, position_repo, snapshot_repo, trade_repo};
use crate::models::failure::NewFailureRecord;
use crate::models::trade::NewTradeRecord;
use crate::models::{
    FailureRecord, FollowConfig, FollowerPosition, MasterPosition, NewFollowConfig, PositionKey,
    TradeRecord,
};

use super::{
    EngineStore, FailureRegister, FollowConfigStore, PositionStore, SnapshotStore, TradeLedger,
};

/// Postgres-backed store; a thin adapter over the `db::*_repo` functions.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FollowConfigStore for PgStore {
    async fn active_configs(&self) -> anyhow::Result<Vec<FollowConfig>> {
        follow_config_repo::get_active_configs(&self.pool).await
    }

    async fn config_for_follower(&self, follower_user_id: i64) -> anyhow::Result<Option<FollowConfig>> {
        follow_config_repo::get_config_by_follower(&self.pool, follower_user_id).await
    }

    async fn upsert_config(&self, config: &NewFollowConfig) -> anyhow::Result<FollowConfig> {
        follow_config_repo::upsert_config(&self.pool, config).await
    }

    async fn set_config_active(&self, follower_user_id: i64, active: bool) -> anyhow::Result<bool> {
        follow_config_repo::set_active(&self.pool, follower_user_id, active).await
    }
}

#[async_trait]
impl PositionStore for PgStore {
    async fn upsert_master_position(
        &self,
        master_user_id: i64,
        master_credential_id: i64,
        symbol: &str,
        size: Decimal,
        entry_price: Option<Decimal>,
    ) -> anyhow::Result<MasterPosition> {
        position_repo::upsert_master_position(
            &self.pool,
            master_user_id,
            master_credential_id,
            symbol,
            size,
            entry_price,
        )
        .await
    }

    async fn master_positions(
        &self,
        master_user_id: i64,
        master_credential_id: i64,
    ) -> anyhow::Result<Vec<MasterPosition>> {
        position_repo::get_master_positions(&self.pool, master_user_id, master_credential_id).await
    }

    async fn master_positions_by_user(&self, master_user_id: i64) -> anyhow::Result<Vec<MasterPosition>> {
        position_repo::get_master_positions_by_user(&self.pool, master_user_id).await
    }

    async fn follower_position(
        &self,
        user_id: i64,
        credential_id: i64,
        symbol: &str,
    ) -> anyhow::Result<Option<FollowerPosition>> {
        position_repo::get_follower_position(&self.pool, user_id, credential_id, symbol).await
    }

    async fn follower_positions_by_user(&self, user_id: i64) -> anyhow::Result<Vec<FollowerPosition>> {
        position_repo::get_follower_positions_by_user(&self.pool, user_id).await
    }

    async fn upsert_follower_position(
        &self,
        user_id: i64,
        credential_id: i64,
        symbol: &str,
        size: Decimal,
        entry_price: Option<Decimal>,
    ) -> anyhow::Result<FollowerPosition> {
        position_repo::upsert_follower_position(
            &self.pool,
            user_id,
            credential_id,
            symbol,
            size,
            entry_price,
        )
        .await
    }
}

#[async_trait]
impl TradeLedger for PgStore {
    async fn record_pending(&self, trade: &NewTradeRecord) -> anyhow::Result<TradeRecord> {
        trade_repo::insert_pending(&self.pool, trade).await
    }

    async fn mark_filled(
        &self,
        trade_id: Uuid,
        order_id: &str,
        fill_price: Option<Decimal>,
        execution_time_ms: i64,
    ) -> anyhow::Result<()> {
        trade_repo::mark_filled(&self.pool, trade_id, order_id, fill_price, execution_time_ms).await
    }

    async fn mark_failed(
        &self,
        trade_id: Uuid,
        error_message: &str,
        execution_time_ms: i64,
    ) -> anyhow::Result<()> {
        trade_repo::mark_failed(&self.pool, trade_id, error_message, execution_time_ms).await
    }

    async fn trade(&self, trade_id: Uuid) -> anyhow::Result<Option<TradeRecord>> {
        trade_repo::get_trade(&self.pool, trade_id).await
    }

    async fn recent_trades(
        &self,
        follower_user_id: Option<i64>,
        limit: i64,
    ) -> anyhow::Result<Vec<TradeRecord>> {
        trade_repo::get_recent_trades(&self.pool, follower_user_id, limit).await
    }
}

#[async_trait]
impl FailureRegister for PgStore {
    async fn record_failure(&self, failure: &NewFailureRecord) -> anyhow::Result<FailureRecord> {
        failure_repo::insert_failure(&self.pool, failure).await
    }

    async fn has_unresolved(&self, user_id: i64) -> anyhow::Result<bool> {
        failure_repo::has_unresolved(&self.pool, user_id).await
    }

    async fn unresolved_for_user(&self, user_id: i64) -> anyhow::Result<Vec<FailureRecord>> {
        failure_repo::get_unresolved_by_user(&self.pool, user_id).await
    }

    async fn failures_for_user(&self, user_id: i64, limit: i64) -> anyhow::Result<Vec<FailureRecord>> {
        failure_repo::get_failures_by_user(&self.pool, user_id, limit).await
    }

    async fn resolve(&self, failure_id: Uuid, resolved_by: i64) -> anyhow::Result<Option<FailureRecord>> {
        failure_repo::resolve_failure(&self.pool, failure_id, resolved_by).await
    }
}

#[async_trait]
impl SnapshotStore for PgStore {
    async fn load_snapshot(&self) -> anyhow::Result<Vec<(PositionKey, Decimal)>> {
        snapshot_repo::load_snapshot(&self.pool).await
    }

    async fn save_size(&self, key: &PositionKey, size: Decimal) -> anyhow::Result<()> {
        snapshot_repo::save_size(&self.pool, key, size).await
    }
}

#[async_trait]
impl EngineStore for PgStore {
    async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
