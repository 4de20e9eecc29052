use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::models::{FollowerPosition, MasterPosition};

/// Insert or update the master's position for one symbol. A `None` entry
/// price keeps the stored one.
pub async fn upsert_master_position(
    pool: &PgPool,
    master_user_id: i64,
    master_credential_id: i64,
    symbol: &str,
    size: Decimal,
    entry_price: Option<Decimal>,
) -> anyhow::Result<MasterPosition> {
    let pos = sqlx::query_as::<_, MasterPosition>(
        r#"
        INSERT INTO master_positions (master_user_id, master_credential_id, symbol, size, entry_price)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (master_user_id, master_credential_id, symbol) DO UPDATE
            SET size = $4,
                entry_price = COALESCE($5, master_positions.entry_price),
                updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(master_user_id)
    .bind(master_credential_id)
    .bind(symbol)
    .bind(size)
    .bind(entry_price)
    .fetch_one(pool)
    .await?;

    Ok(pos)
}

/// All positions for one master credential.
pub async fn get_master_positions(
    pool: &PgPool,
    master_user_id: i64,
    master_credential_id: i64,
) -> anyhow::Result<Vec<MasterPosition>> {
    let positions = sqlx::query_as::<_, MasterPosition>(
        r#"
        SELECT * FROM master_positions
        WHERE master_user_id = $1 AND master_credential_id = $2
        ORDER BY symbol
        "#,
    )
    .bind(master_user_id)
    .bind(master_credential_id)
    .fetch_all(pool)
    .await?;

    Ok(positions)
}

pub async fn get_master_positions_by_user(
    pool: &PgPool,
    master_user_id: i64,
) -> anyhow::Result<Vec<MasterPosition>> {
    let positions = sqlx::query_as::<_, MasterPosition>(
        "SELECT * FROM master_positions WHERE master_user_id = $1 ORDER BY master_credential_id, symbol",
    )
    .bind(master_user_id)
    .fetch_all(pool)
    .await?;

    Ok(positions)
}

pub async fn get_follower_position(
    pool: &PgPool,
    user_id: i64,
    credential_id: i64,
    symbol: &str,
) -> anyhow::Result<Option<FollowerPosition>> {
    let pos = sqlx::query_as::<_, FollowerPosition>(
        r#"
        SELECT * FROM follower_positions
        WHERE user_id = $1 AND credential_id = $2 AND symbol = $3
        "#,
    )
    .bind(user_id)
    .bind(credential_id)
    .bind(symbol)
    .fetch_optional(pool)
    .await?;

    Ok(pos)
}

pub async fn get_follower_positions_by_user(
    pool: &PgPool,
    user_id: i64,
) -> anyhow::Result<Vec<FollowerPosition>> {
    let positions = sqlx::query_as::<_, FollowerPosition>(
        "SELECT * FROM follower_positions WHERE user_id = $1 ORDER BY credential_id, symbol",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(positions)
}

/// Set the follower's book for a symbol to an absolute size.
pub async fn upsert_follower_position(
    pool: &PgPool,
    user_id: i64,
    credential_id: i64,
    symbol: &str,
    size: Decimal,
    entry_price: Option<Decimal>,
) -> anyhow::Result<FollowerPosition> {
    let pos = sqlx::query_as::<_, FollowerPosition>(
        r#"
        INSERT INTO follower_positions (user_id, credential_id, symbol, size, entry_price)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id, credential_id, symbol) DO UPDATE
            SET size = $4,
                entry_price = COALESCE($5, follower_positions.entry_price),
                updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(credential_id)
    .bind(symbol)
    .bind(size)
    .bind(entry_price)
    .fetch_one(pool)
    .await?;

    Ok(pos)
}
