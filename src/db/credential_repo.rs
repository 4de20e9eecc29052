use sqlx::PgPool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CredentialRow {
    pub id: i64,
    pub user_id: i64,
    pub exchange_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub passphrase: Option<String>,
    pub is_active: bool,
}

/// Look up a stored credential by id.
pub async fn get_credential(pool: &PgPool, credential_id: i64) -> anyhow::Result<Option<CredentialRow>> {
    let row = sqlx::query_as::<_, CredentialRow>(
        r#"
        SELECT id, user_id, exchange_name, api_key, api_secret, passphrase, is_active
        FROM api_credentials
        WHERE id = $1
        "#,
    )
    .bind(credential_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
