use std::sync::Arc;
use std::time::Instant;

use metrics::counter;
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::exchange::{ConnectorFactory, ExchangeError, OrderDescriptor, OrderRequest};
use crate::models::failure::NewFailureRecord;
use crate::models::trade::{trade_action, NewTradeRecord};
use crate::models::{CopyMode, FollowConfig, MasterPosition, OrderType, Side};
use crate::services::credentials::{CredentialError, CredentialResolver};
use crate::services::notifier::{TradeFailure, TradeNotifier, TradeSuccess};
use crate::store::EngineStore;

use super::failures;

/// Deltas smaller than this (0.0001) are treated as already in sync.
pub fn sync_tolerance() -> Decimal {
    Decimal::new(1, 4)
}

/// A sizing step left the representable decimal range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("order size out of range")]
pub struct SizeOverflow;

/// Follower target for a master size: `master_size x ratio`.
pub fn target_size(master_size: Decimal, copy_ratio: Decimal) -> Result<Decimal, SizeOverflow> {
    master_size.checked_mul(copy_ratio).ok_or(SizeOverflow)
}

/// Order needed to move `current` to `target`, or `None` if within tolerance.
pub fn plan_order(current: Decimal, target: Decimal) -> Result<Option<(Side, Decimal)>, SizeOverflow> {
    let delta = target.checked_sub(current).ok_or(SizeOverflow)?;
    if delta.abs() < sync_tolerance() {
        return Ok(None);
    }
    let side = if delta > Decimal::ZERO { Side::Buy } else { Side::Sell };
    Ok(Some((side, delta.abs())))
}

/// Ratio-only sizing: resend `|master_size| x ratio` in the master's direction.
pub fn mirror_order(master_size: Decimal, copy_ratio: Decimal) -> Result<Option<(Side, Decimal)>, SizeOverflow> {
    let amount = target_size(master_size, copy_ratio)?.abs();
    if amount < sync_tolerance() {
        return Ok(None);
    }
    let side = if master_size > Decimal::ZERO { Side::Buy } else { Side::Sell };
    Ok(Some((side, amount)))
}

/// Deterministic slippage estimate: `0.001 x (1 + amount x 0.1)`.
pub fn estimate_slippage(amount: Decimal) -> Result<Decimal, SizeOverflow> {
    let base = Decimal::new(1, 3);
    let size_factor = Decimal::new(1, 1);
    amount
        .checked_mul(size_factor)
        .and_then(|scaled| Decimal::ONE.checked_add(scaled))
        .and_then(|factor| base.checked_mul(factor))
        .ok_or(SizeOverflow)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The follower has an unresolved failure.
    Suspended,
    /// Reading state or writing the pending ledger entry failed.
    DataError,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    Filled {
        trade_id: Uuid,
        order_id: String,
        side: Side,
        amount: Decimal,
    },
    InSync,
    Skipped(SkipReason),
    Failed {
        trade_id: Uuid,
        error_type: &'static str,
    },
}

/// Errors that suspend the follower.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("persistence error: {0}")]
    Persistence(anyhow::Error),
}

impl ReconcileError {
    pub fn error_type(&self) -> &'static str {
        match self {
            ReconcileError::Credential(_) => "credential_error",
            ReconcileError::Exchange(_) => "exchange_error",
            ReconcileError::Persistence(_) => "persistence_error",
        }
    }
}

/// The order planned for one follower before it is submitted.
#[derive(Debug, Clone)]
struct PlannedOrder {
    action: &'static str,
    side: Side,
    amount: Decimal,
    current: Option<Decimal>,
    target: Option<Decimal>,
}

/// Brings one follower in line with one master signal.
#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn EngineStore>,
    credentials: Arc<dyn CredentialResolver>,
    connectors: Arc<dyn ConnectorFactory>,
    notifier: Option<Arc<dyn TradeNotifier>>,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn EngineStore>,
        credentials: Arc<dyn CredentialResolver>,
        connectors: Arc<dyn ConnectorFactory>,
        notifier: Option<Arc<dyn TradeNotifier>>,
    ) -> Self {
        Self {
            store,
            credentials,
            connectors,
            notifier,
        }
    }

    pub async fn reconcile(&self, config: &FollowConfig, master: &MasterPosition) -> ReconcileOutcome {
        let follower = config.follower_user_id;

        match self.store.has_unresolved(follower).await {
            Ok(true) => {
                tracing::info!(follower, symbol = %master.symbol, "Follower suspended, skipping signal");
                counter!("reconciliations_skipped").increment(1);
                return ReconcileOutcome::Skipped(SkipReason::Suspended);
            }
            Ok(false) => {}
            Err(e) => return self.data_error(follower, &master.symbol, "failure register", e),
        }

        let planned = match config.mode() {
            CopyMode::Reconcile => {
                let current = match self
                    .store
                    .follower_position(follower, config.follower_credential_id, &master.symbol)
                    .await
                {
                    Ok(pos) => pos.map(|p| p.size).unwrap_or(Decimal::ZERO),
                    Err(e) => return self.data_error(follower, &master.symbol, "follower position", e),
                };
                let sized = target_size(master.size, config.copy_ratio)
                    .and_then(|target| plan_order(current, target).map(|order| (target, order)));
                let (target, order) = match sized {
                    Ok(sized) => sized,
                    Err(e) => return self.data_error(follower, &master.symbol, "order sizing", e.into()),
                };

                let Some((side, amount)) = order else {
                    tracing::debug!(
                        follower,
                        symbol = %master.symbol,
                        current = %current,
                        target = %target,
                        "Follower already in sync"
                    );
                    return ReconcileOutcome::InSync;
                };

                let action = if target.abs() > current.abs() {
                    trade_action::INCREASE
                } else {
                    trade_action::REDUCE
                };

                PlannedOrder {
                    action,
                    side,
                    amount,
                    current: Some(current),
                    target: Some(target),
                }
            }
            CopyMode::Mirror => {
                let order = match mirror_order(master.size, config.copy_ratio) {
                    Ok(order) => order,
                    Err(e) => return self.data_error(follower, &master.symbol, "order sizing", e.into()),
                };
                let Some((side, amount)) = order else {
                    tracing::debug!(follower, symbol = %master.symbol, "Master flat, nothing to mirror");
                    return ReconcileOutcome::InSync;
                };

                PlannedOrder {
                    action: trade_action::MIRROR,
                    side,
                    amount,
                    current: None,
                    target: None,
                }
            }
        };

        let slippage = match estimate_slippage(planned.amount) {
            Ok(slippage) => slippage,
            Err(e) => return self.data_error(follower, &master.symbol, "order sizing", e.into()),
        };

        let pending = NewTradeRecord {
            follow_config_id: config.id,
            follower_user_id: follower,
            follower_credential_id: config.follower_credential_id,
            master_user_id: config.master_user_id,
            master_credential_id: config.master_credential_id,
            symbol: master.symbol.clone(),
            side: planned.side.as_str().to_string(),
            order_type: OrderType::Market.as_str().to_string(),
            action: planned.action.to_string(),
            amount: planned.amount,
            copy_ratio: config.copy_ratio,
            estimated_slippage: slippage,
            master_size: master.size,
            master_entry_price: master.entry_price,
            follower_size_before: planned.current,
            target_size: planned.target,
        };

        let trade = match self.store.record_pending(&pending).await {
            Ok(t) => t,
            Err(e) => return self.data_error(follower, &master.symbol, "trade ledger", e),
        };

        tracing::info!(
            trade_id = %trade.id,
            follower,
            symbol = %master.symbol,
            side = %planned.side,
            amount = %planned.amount,
            action = planned.action,
            slippage = %slippage,
            "Submitting follower order"
        );

        let started = Instant::now();
        let result = self.execute(config, master, &planned).await;
        let elapsed_ms = started.elapsed().as_millis() as i64;

        match result {
            Ok(order) => {
                if let Err(e) = self
                    .store
                    .mark_filled(trade.id, &order.id, order.price, elapsed_ms)
                    .await
                {
                    tracing::error!(error = %e, trade_id = %trade.id, "Failed to mark trade filled");
                }

                counter!("reconciliations_filled").increment(1);
                tracing::info!(
                    trade_id = %trade.id,
                    order_id = %order.id,
                    follower,
                    fill_price = ?order.price,
                    elapsed_ms,
                    "Follower order filled"
                );

                self.spawn_success_notice(TradeSuccess {
                    follower_user_id: follower,
                    symbol: master.symbol.clone(),
                    side: planned.side,
                    amount: planned.amount,
                    price: order.price,
                    order_id: order.id.clone(),
                });

                ReconcileOutcome::Filled {
                    trade_id: trade.id,
                    order_id: order.id,
                    side: planned.side,
                    amount: planned.amount,
                }
            }
            Err(err) => {
                let error_type = err.error_type();
                let message = err.to_string();

                counter!("reconciliations_failed").increment(1);
                tracing::error!(
                    trade_id = %trade.id,
                    follower,
                    symbol = %master.symbol,
                    error_type,
                    error = %message,
                    "Follower order failed"
                );

                if let Err(e) = self.store.mark_failed(trade.id, &message, elapsed_ms).await {
                    tracing::error!(error = %e, trade_id = %trade.id, "Failed to mark trade failed");
                }

                let details = json!({
                    "symbol": master.symbol,
                    "side": planned.side.as_str(),
                    "amount": planned.amount,
                    "action": planned.action,
                    "current_size": planned.current,
                    "target_size": planned.target,
                    "master_size": master.size,
                    "copy_ratio": config.copy_ratio,
                    "copy_mode": config.mode().as_str(),
                });

                let failure = NewFailureRecord {
                    user_id: follower,
                    trade_record_id: Some(trade.id),
                    error_type: error_type.to_string(),
                    error_message: message.clone(),
                    error_details: Some(details.clone()),
                };
                if let Err(e) = failures::suspend_follower(self.store.as_ref(), &failure).await {
                    tracing::error!(error = %e, follower, "Failed to record failure");
                }

                self.spawn_failure_notice(TradeFailure {
                    follower_user_id: follower,
                    error_type: error_type.to_string(),
                    error_message: message,
                    context: details,
                });

                ReconcileOutcome::Failed {
                    trade_id: trade.id,
                    error_type,
                }
            }
        }
    }

    /// Credentials, connector, order, and (in reconcile mode) the follower book.
    async fn execute(
        &self,
        config: &FollowConfig,
        master: &MasterPosition,
        planned: &PlannedOrder,
    ) -> Result<OrderDescriptor, ReconcileError> {
        let credentials = self
            .credentials
            .resolve(config.follower_credential_id, config.follower_user_id)
            .await?;
        let connector = self.connectors.connect(&credentials)?;

        let request = OrderRequest::market(&master.symbol, planned.side, planned.amount);
        let order = connector.create_order(&request).await?;

        if let Some(target) = planned.target {
            self.store
                .upsert_follower_position(
                    config.follower_user_id,
                    config.follower_credential_id,
                    &master.symbol,
                    target,
                    master.entry_price,
                )
                .await
                .map_err(ReconcileError::Persistence)?;
        }

        Ok(order)
    }

    fn data_error(&self, follower: i64, symbol: &str, source: &str, e: anyhow::Error) -> ReconcileOutcome {
        tracing::error!(error = %e, follower, symbol, source, "Data error, skipping follower");
        counter!("reconciliations_skipped").increment(1);
        ReconcileOutcome::Skipped(SkipReason::DataError)
    }

    fn spawn_success_notice(&self, event: TradeSuccess) {
        let Some(notifier) = self.notifier.clone() else {
            return;
        };
        tokio::spawn(async move {
            if let Err(e) = notifier.notify_trade_success(&event).await {
                tracing::warn!(error = %e, follower = event.follower_user_id, "Trade notification failed");
            }
        });
    }

    fn spawn_failure_notice(&self, event: TradeFailure) {
        let Some(notifier) = self.notifier.clone() else {
            return;
        };
        tokio::spawn(async move {
            if let Err(e) = notifier.notify_error(&event).await {
                tracing::warn!(error = %e, follower = event.follower_user_id, "Failure notification failed");
            }
        });
    }
}
