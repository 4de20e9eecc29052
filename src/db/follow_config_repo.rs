use sqlx::PgPool;

use crate::models::{FollowConfig, NewFollowConfig};

/// All follow configs currently eligible for copying.
pub async fn get_active_configs(pool: &PgPool) -> anyhow::Result<Vec<FollowConfig>> {
    let configs = sqlx::query_as::<_, FollowConfig>(
        "SELECT * FROM follow_configs WHERE is_active = true ORDER BY master_user_id, follower_user_id",
    )
    .fetch_all(pool)
    .await?;

    Ok(configs)
}

pub async fn get_config_by_follower(
    pool: &PgPool,
    follower_user_id: i64,
) -> anyhow::Result<Option<FollowConfig>> {
    let config = sqlx::query_as::<_, FollowConfig>(
        "SELECT * FROM follow_configs WHERE follower_user_id = $1",
    )
    .bind(follower_user_id)
    .fetch_optional(pool)
    .await?;

    Ok(config)
}

/// Create or replace the follower's single follow config.
pub async fn upsert_config(pool: &PgPool, config: &NewFollowConfig) -> anyhow::Result<FollowConfig> {
    let config = sqlx::query_as::<_, FollowConfig>(
        r#"
        INSERT INTO follow_configs
            (follower_user_id, master_user_id, master_credential_id, follower_credential_id,
             copy_ratio, copy_mode, is_active)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (follower_user_id) DO UPDATE
            SET master_user_id = $2,
                master_credential_id = $3,
                follower_credential_id = $4,
                copy_ratio = $5,
                copy_mode = $6,
                is_active = $7,
                updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(config.follower_user_id)
    .bind(config.master_user_id)
    .bind(config.master_credential_id)
    .bind(config.follower_credential_id)
    .bind(config.copy_ratio)
    .bind(config.copy_mode.as_str())
    .bind(config.is_active)
    .fetch_one(pool)
    .await?;

    Ok(config)
}

/// Flip the follower's config on or off. Returns false when the follower has none.
pub async fn set_active(pool: &PgPool, follower_user_id: i64, active: bool) -> anyhow::Result<bool> {
    let result = sqlx::query(
        "UPDATE follow_configs SET is_active = $2, updated_at = NOW() WHERE follower_user_id = $1",
    )
    .bind(follower_user_id)
    .bind(active)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
