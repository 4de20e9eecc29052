use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::trade::{NewTradeRecord, TradeRecord};

/// Append a trade record in `pending` state.
pub async fn insert_pending(pool: &PgPool, trade: &NewTradeRecord) -> anyhow::Result<TradeRecord> {
    let record = sqlx::query_as::<_, TradeRecord>(
        r#"
        INSERT INTO trade_records
            (follow_config_id, follower_user_id, follower_credential_id, master_user_id,
             master_credential_id, symbol, side, order_type, action, amount, copy_ratio,
             estimated_slippage, master_size, master_entry_price, follower_size_before,
             target_size, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, 'pending')
        RETURNING *
        "#,
    )
    .bind(trade.follow_config_id)
    .bind(trade.follower_user_id)
    .bind(trade.follower_credential_id)
    .bind(trade.master_user_id)
    .bind(trade.master_credential_id)
    .bind(&trade.symbol)
    .bind(&trade.side)
    .bind(&trade.order_type)
    .bind(&trade.action)
    .bind(trade.amount)
    .bind(trade.copy_ratio)
    .bind(trade.estimated_slippage)
    .bind(trade.master_size)
    .bind(trade.master_entry_price)
    .bind(trade.follower_size_before)
    .bind(trade.target_size)
    .fetch_one(pool)
    .await?;

    Ok(record)
}

/// Mark a pending record as filled.
pub async fn mark_filled(
    pool: &PgPool,
    trade_id: Uuid,
    order_id: &str,
    fill_price: Option<Decimal>,
    execution_time_ms: i64,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE trade_records
        SET status = 'filled', order_id = $2, fill_price = $3, execution_time_ms = $4, executed_at = $5
        WHERE id = $1
        "#,
    )
    .bind(trade_id)
    .bind(order_id)
    .bind(fill_price)
    .bind(execution_time_ms)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}

/// Mark a pending record as failed with error message.
pub async fn mark_failed(
    pool: &PgPool,
    trade_id: Uuid,
    error_message: &str,
    execution_time_ms: i64,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE trade_records
        SET status = 'failed', error_message = $2, execution_time_ms = $3, executed_at = $4
        WHERE id = $1
        "#,
    )
    .bind(trade_id)
    .bind(error_message)
    .bind(execution_time_ms)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_trade(pool: &PgPool, trade_id: Uuid) -> anyhow::Result<Option<TradeRecord>> {
    let record = sqlx::query_as::<_, TradeRecord>("SELECT * FROM trade_records WHERE id = $1")
        .bind(trade_id)
        .fetch_optional(pool)
        .await?;

    Ok(record)
}

/// Most recent records first, optionally for one follower.
pub async fn get_recent_trades(
    pool: &PgPool,
    follower_user_id: Option<i64>,
    limit: i64,
) -> anyhow::Result<Vec<TradeRecord>> {
    let records = sqlx::query_as::<_, TradeRecord>(
        r#"
        SELECT * FROM trade_records
        WHERE ($1::BIGINT IS NULL OR follower_user_id = $1)
        ORDER BY created_at DESC
        LIMIT $2
        "#,
    )
    .bind(follower_user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(records)
}
