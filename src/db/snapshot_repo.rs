use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::models::PositionKey;

#[derive(Debug, Clone, sqlx::FromRow)]
struct SnapshotRow {
    master_user_id: i64,
    master_credential_id: i64,
    symbol: String,
    last_size: Decimal,
}

/// Every persisted "last observed size" entry of the change detector.
pub async fn load_snapshot(pool: &PgPool) -> anyhow::Result<Vec<(PositionKey, Decimal)>> {
    let rows = sqlx::query_as::<_, SnapshotRow>(
        "SELECT master_user_id, master_credential_id, symbol, last_size FROM detector_snapshots",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| {
            (
                PositionKey::new(r.master_user_id, r.master_credential_id, &r.symbol),
                r.last_size,
            )
        })
        .collect())
}

pub async fn save_size(pool: &PgPool, key: &PositionKey, size: Decimal) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO detector_snapshots (master_user_id, master_credential_id, symbol, last_size, updated_at)
        VALUES ($1, $2, $3, $4, NOW())
        ON CONFLICT (master_user_id, master_credential_id, symbol) DO UPDATE
            SET last_size = $4, updated_at = NOW()
        "#,
    )
    .bind(key.user_id)
    .bind(key.credential_id)
    .bind(&key.symbol)
    .bind(size)
    .execute(pool)
    .await?;

    Ok(())
}
