use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use crate::db::credential_repo;

/// Decrypted trading credentials for one account.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
    pub passphrase: Option<String>,
    /// Venue name, e.g. `"mock"` or `"binance"`.
    pub exchange: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &format!("{}...", self.api_key.chars().take(4).collect::<String>()))
            .field("api_secret", &"<redacted>")
            .field("passphrase", &self.passphrase.as_ref().map(|_| "<redacted>"))
            .field("exchange", &self.exchange)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential {0} not found")]
    NotFound(i64),

    #[error("credential {credential_id} does not belong to user {user_id}")]
    AccessDenied { credential_id: i64, user_id: i64 },

    #[error("credential backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

/// Hands out decrypted credentials for a stored credential reference.
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    async fn resolve(&self, credential_id: i64, owner_user_id: i64)
        -> Result<Credentials, CredentialError>;
}

/// Reads the `api_credentials` table. Secrets arrive there already decrypted by
/// the credential service that owns encryption.
#[derive(Debug, Clone)]
pub struct PgCredentialResolver {
    pool: PgPool,
}

impl PgCredentialResolver {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialResolver for PgCredentialResolver {
    async fn resolve(
        &self,
        credential_id: i64,
        owner_user_id: i64,
    ) -> Result<Credentials, CredentialError> {
        let row = credential_repo::get_credential(&self.pool, credential_id)
            .await?
            .ok_or(CredentialError::NotFound(credential_id))?;

        if row.user_id != owner_user_id {
            return Err(CredentialError::AccessDenied {
                credential_id,
                user_id: owner_user_id,
            });
        }
        if !row.is_active {
            return Err(CredentialError::NotFound(credential_id));
        }

        Ok(Credentials {
            api_key: row.api_key,
            api_secret: row.api_secret,
            passphrase: row.passphrase,
            exchange: row.exchange_name,
        })
    }
}

/// Fixed in-memory credential table, keyed by credential id. Used by the
/// integration harness; the binary always resolves through Postgres.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialResolver {
    entries: HashMap<i64, (i64, Credentials)>,
}

impl StaticCredentialResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, credential_id: i64, owner_user_id: i64, credentials: Credentials) -> Self {
        self.entries.insert(credential_id, (owner_user_id, credentials));
        self
    }

    /// Convenience for a `mock` venue credential.
    pub fn with_mock(self, credential_id: i64, owner_user_id: i64, api_key: &str) -> Self {
        self.with(
            credential_id,
            owner_user_id,
            Credentials {
                api_key: api_key.to_string(),
                api_secret: format!("{api_key}-secret"),
                passphrase: None,
                exchange: "mock".into(),
            },
        )
    }
}

#[async_trait]
impl CredentialResolver for StaticCredentialResolver {
    async fn resolve(
        &self,
        credential_id: i64,
        owner_user_id: i64,
    ) -> Result<Credentials, CredentialError> {
        match self.entries.get(&credential_id) {
            None => Err(CredentialError::NotFound(credential_id)),
            Some((owner, _)) if *owner != owner_user_id => Err(CredentialError::AccessDenied {
                credential_id,
                user_id: owner_user_id,
            }),
            Some((_, creds)) => Ok(creds.clone()),
        }
    }
}
