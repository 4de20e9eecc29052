use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::failure::{FailureRecord, NewFailureRecord};

pub async fn insert_failure(pool: &PgPool, failure: &NewFailureRecord) -> anyhow::Result<FailureRecord> {
    let record = sqlx::query_as::<_, FailureRecord>(
        r#"
        INSERT INTO failure_records (user_id, trade_record_id, error_type, error_message, error_details)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(failure.user_id)
    .bind(failure.trade_record_id)
    .bind(&failure.error_type)
    .bind(&failure.error_message)
    .bind(&failure.error_details)
    .fetch_one(pool)
    .await?;

    Ok(record)
}

pub async fn has_unresolved(pool: &PgPool, user_id: i64) -> anyhow::Result<bool> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS (SELECT 1 FROM failure_records WHERE user_id = $1 AND is_resolved = false)",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

pub async fn get_unresolved_by_user(pool: &PgPool, user_id: i64) -> anyhow::Result<Vec<FailureRecord>> {
    let records = sqlx::query_as::<_, FailureRecord>(
        r#"
        SELECT * FROM failure_records
        WHERE user_id = $1 AND is_resolved = false
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(records)
}

pub async fn get_failures_by_user(
    pool: &PgPool,
    user_id: i64,
    limit: i64,
) -> anyhow::Result<Vec<FailureRecord>> {
    let records = sqlx::query_as::<_, FailureRecord>(
        "SELECT * FROM failure_records WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(records)
}

/// Mark a failure resolved. Returns `None` if the id does not exist.
pub async fn resolve_failure(
    pool: &PgPool,
    failure_id: Uuid,
    resolved_by: i64,
) -> anyhow::Result<Option<FailureRecord>> {
    let record = sqlx::query_as::<_, FailureRecord>(
        r#"
        UPDATE failure_records
        SET is_resolved = true, resolved_at = $3, resolved_by = $2
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(failure_id)
    .bind(resolved_by)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?;

    Ok(record)
}
