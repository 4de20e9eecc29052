use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::failure::NewFailureRecord;
use crate::models::trade::{trade_status, NewTradeRecord};
use crate::models::{
    FailureRecord, FollowConfig, FollowerPosition, MasterPosition, NewFollowConfig, PositionKey,
    TradeRecord,
};

use super::{
    EngineStore, FailureRegister, FollowConfigStore, PositionStore, SnapshotStore, TradeLedger,
};

#[derive(Debug, Default)]
struct Tables {
    /// Keyed by follower user id (one config per follower).
    configs: HashMap<i64, FollowConfig>,
    master_positions: HashMap<PositionKey, MasterPosition>,
    follower_positions: HashMap<PositionKey, FollowerPosition>,
    /// Insertion order is creation order.
    trades: Vec<TradeRecord>,
    failures: Vec<FailureRecord>,
    snapshot: HashMap<PositionKey, Decimal>,
}

/// Process-local store with the same semantics as [`super::PgStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FollowConfigStore for MemoryStore {
    async fn active_configs(&self) -> anyhow::Result<Vec<FollowConfig>> {
        let tables = self.tables.read().await;
        let mut configs: Vec<FollowConfig> =
            tables.configs.values().filter(|c| c.is_active).cloned().collect();
        configs.sort_by_key(|c| (c.master_user_id, c.follower_user_id));
        Ok(configs)
    }

    async fn config_for_follower(&self, follower_user_id: i64) -> anyhow::Result<Option<FollowConfig>> {
        Ok(self.tables.read().await.configs.get(&follower_user_id).cloned())
    }

    async fn upsert_config(&self, config: &NewFollowConfig) -> anyhow::Result<FollowConfig> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        let row = match tables.configs.get(&config.follower_user_id) {
            Some(existing) => FollowConfig {
                id: existing.id,
                created_at: existing.created_at,
                follower_user_id: config.follower_user_id,
                master_user_id: config.master_user_id,
                master_credential_id: config.master_credential_id,
                follower_credential_id: config.follower_credential_id,
                copy_ratio: config.copy_ratio,
                copy_mode: config.copy_mode.as_str().to_string(),
                is_active: config.is_active,
                updated_at: now,
            },
            None => FollowConfig {
                id: Uuid::new_v4(),
                created_at: now,
                follower_user_id: config.follower_user_id,
                master_user_id: config.master_user_id,
                master_credential_id: config.master_credential_id,
                follower_credential_id: config.follower_credential_id,
                copy_ratio: config.copy_ratio,
                copy_mode: config.copy_mode.as_str().to_string(),
                is_active: config.is_active,
                updated_at: now,
            },
        };

        tables.configs.insert(config.follower_user_id, row.clone());
        Ok(row)
    }

    async fn set_config_active(&self, follower_user_id: i64, active: bool) -> anyhow::Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.configs.get_mut(&follower_user_id) {
            Some(config) => {
                config.is_active = active;
                config.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl PositionStore for MemoryStore {
    async fn upsert_master_position(
        &self,
        master_user_id: i64,
        master_credential_id: i64,
        symbol: &str,
        size: Decimal,
        entry_price: Option<Decimal>,
    ) -> anyhow::Result<MasterPosition> {
        let mut tables = self.tables.write().await;
        let key = PositionKey::new(master_user_id, master_credential_id, symbol);
        let now = Utc::now();

        let pos = tables
            .master_positions
            .entry(key)
            .and_modify(|p| {
                p.size = size;
                if entry_price.is_some() {
                    p.entry_price = entry_price;
                }
                p.updated_at = now;
            })
            .or_insert_with(|| MasterPosition {
                id: Uuid::new_v4(),
                master_user_id,
                master_credential_id,
                symbol: symbol.to_string(),
                size,
                entry_price,
                updated_at: now,
            });

        Ok(pos.clone())
    }

    async fn master_positions(
        &self,
        master_user_id: i64,
        master_credential_id: i64,
    ) -> anyhow::Result<Vec<MasterPosition>> {
        let tables = self.tables.read().await;
        let mut positions: Vec<MasterPosition> = tables
            .master_positions
            .values()
            .filter(|p| p.master_user_id == master_user_id && p.master_credential_id == master_credential_id)
            .cloned()
            .collect();
        positions.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(positions)
    }

    async fn master_positions_by_user(&self, master_user_id: i64) -> anyhow::Result<Vec<MasterPosition>> {
        let tables = self.tables.read().await;
        let mut positions: Vec<MasterPosition> = tables
            .master_positions
            .values()
            .filter(|p| p.master_user_id == master_user_id)
            .cloned()
            .collect();
        positions.sort_by(|a, b| {
            (a.master_credential_id, &a.symbol).cmp(&(b.master_credential_id, &b.symbol))
        });
        Ok(positions)
    }

    async fn follower_position(
        &self,
        user_id: i64,
        credential_id: i64,
        symbol: &str,
    ) -> anyhow::Result<Option<FollowerPosition>> {
        let key = PositionKey::new(user_id, credential_id, symbol);
        Ok(self.tables.read().await.follower_positions.get(&key).cloned())
    }

    async fn follower_positions_by_user(&self, user_id: i64) -> anyhow::Result<Vec<FollowerPosition>> {
        let tables = self.tables.read().await;
        let mut positions: Vec<FollowerPosition> = tables
            .follower_positions
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        positions.sort_by(|a, b| (a.credential_id, &a.symbol).cmp(&(b.credential_id, &b.symbol)));
        Ok(positions)
    }

    async fn upsert_follower_position(
        &self,
        user_id: i64,
        credential_id: i64,
        symbol: &str,
        size: Decimal,
        entry_price: Option<Decimal>,
    ) -> anyhow::Result<FollowerPosition> {
        let mut tables = self.tables.write().await;
        let key = PositionKey::new(user_id, credential_id, symbol);
        let now = Utc::now();

        let pos = tables
            .follower_positions
            .entry(key)
            .and_modify(|p| {
                p.size = size;
                if entry_price.is_some() {
                    p.entry_price = entry_price;
                }
                p.updated_at = now;
            })
            .or_insert_with(|| FollowerPosition {
                id: Uuid::new_v4(),
                user_id,
                credential_id,
                symbol: symbol.to_string(),
                size,
                entry_price,
                updated_at: now,
            });

        Ok(pos.clone())
    }
}

#[async_trait]
impl TradeLedger for MemoryStore {
    async fn record_pending(&self, trade: &NewTradeRecord) -> anyhow::Result<TradeRecord> {
        let record = TradeRecord {
            id: Uuid::new_v4(),
            follow_config_id: trade.follow_config_id,
            follower_user_id: trade.follower_user_id,
            follower_credential_id: trade.follower_credential_id,
            master_user_id: trade.master_user_id,
            master_credential_id: trade.master_credential_id,
            symbol: trade.symbol.clone(),
            side: trade.side.clone(),
            order_type: trade.order_type.clone(),
            action: trade.action.clone(),
            amount: trade.amount,
            copy_ratio: trade.copy_ratio,
            estimated_slippage: trade.estimated_slippage,
            master_size: trade.master_size,
            master_entry_price: trade.master_entry_price,
            follower_size_before: trade.follower_size_before,
            target_size: trade.target_size,
            order_id: None,
            fill_price: None,
            status: trade_status::PENDING.into(),
            error_message: None,
            execution_time_ms: None,
            created_at: Utc::now(),
            executed_at: None,
        };

        self.tables.write().await.trades.push(record.clone());
        Ok(record)
    }

    async fn mark_filled(
        &self,
        trade_id: Uuid,
        order_id: &str,
        fill_price: Option<Decimal>,
        execution_time_ms: i64,
    ) -> anyhow::Result<()> {
        let mut tables = self.tables.write().await;
        if let Some(t) = tables.trades.iter_mut().find(|t| t.id == trade_id) {
            t.status = trade_status::FILLED.into();
            t.order_id = Some(order_id.to_string());
            t.fill_price = fill_price;
            t.execution_time_ms = Some(execution_time_ms);
            t.executed_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn mark_failed(
        &self,
        trade_id: Uuid,
        error_message: &str,
        execution_time_ms: i64,
    ) -> anyhow::Result<()> {
        let mut tables = self.tables.write().await;
        if let Some(t) = tables.trades.iter_mut().find(|t| t.id == trade_id) {
            t.status = trade_status::FAILED.into();
            t.error_message = Some(error_message.to_string());
            t.execution_time_ms = Some(execution_time_ms);
            t.executed_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn trade(&self, trade_id: Uuid) -> anyhow::Result<Option<TradeRecord>> {
        let tables = self.tables.read().await;
        Ok(tables.trades.iter().find(|t| t.id == trade_id).cloned())
    }

    async fn recent_trades(
        &self,
        follower_user_id: Option<i64>,
        limit: i64,
    ) -> anyhow::Result<Vec<TradeRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .trades
            .iter()
            .rev()
            .filter(|t| follower_user_id.map_or(true, |id| t.follower_user_id == id))
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl FailureRegister for MemoryStore {
    async fn record_failure(&self, failure: &NewFailureRecord) -> anyhow::Result<FailureRecord> {
        let record = FailureRecord {
            id: Uuid::new_v4(),
            user_id: failure.user_id,
            trade_record_id: failure.trade_record_id,
            error_type: failure.error_type.clone(),
            error_message: failure.error_message.clone(),
            error_details: failure.error_details.clone(),
            is_resolved: false,
            resolved_at: None,
            resolved_by: None,
            created_at: Utc::now(),
        };

        self.tables.write().await.failures.push(record.clone());
        Ok(record)
    }

    async fn has_unresolved(&self, user_id: i64) -> anyhow::Result<bool> {
        let tables = self.tables.read().await;
        Ok(tables.failures.iter().any(|f| f.user_id == user_id && !f.is_resolved))
    }

    async fn unresolved_for_user(&self, user_id: i64) -> anyhow::Result<Vec<FailureRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .failures
            .iter()
            .rev()
            .filter(|f| f.user_id == user_id && !f.is_resolved)
            .cloned()
            .collect())
    }

    async fn failures_for_user(&self, user_id: i64, limit: i64) -> anyhow::Result<Vec<FailureRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .failures
            .iter()
            .rev()
            .filter(|f| f.user_id == user_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn resolve(&self, failure_id: Uuid, resolved_by: i64) -> anyhow::Result<Option<FailureRecord>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .failures
            .iter_mut()
            .find(|f| f.id == failure_id)
            .map(|f| {
                f.is_resolved = true;
                f.resolved_at = Some(Utc::now());
                f.resolved_by = Some(resolved_by);
                f.clone()
            }))
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn load_snapshot(&self) -> anyhow::Result<Vec<(PositionKey, Decimal)>> {
        let tables = self.tables.read().await;
        Ok(tables.snapshot.iter().map(|(k, v)| (k.clone(), *v)).collect())
    }

    async fn save_size(&self, key: &PositionKey, size: Decimal) -> anyhow::Result<()> {
        self.tables.write().await.snapshot.insert(key.clone(), size);
        Ok(())
    }
}

#[async_trait]
impl EngineStore for MemoryStore {
    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
