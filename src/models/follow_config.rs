use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One copying relationship. A follower user owns at most one.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FollowConfig {
    pub id: Uuid,
    pub follower_user_id: i64,
    pub master_user_id: i64,
    pub master_credential_id: i64,
    pub follower_credential_id: i64,
    pub copy_ratio: Decimal,
    /// Stored as text; see [`CopyMode`].
    pub copy_mode: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FollowConfig {
    pub fn mode(&self) -> CopyMode {
        self.copy_mode.parse().unwrap_or_default()
    }

    /// Grouping key used by the monitoring loop.
    pub fn master_key(&self) -> (i64, i64) {
        (self.master_user_id, self.master_credential_id)
    }
}

/// Fields supplied when a follower opts in or edits their config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFollowConfig {
    pub follower_user_id: i64,
    pub master_user_id: i64,
    pub master_credential_id: i64,
    pub follower_credential_id: i64,
    pub copy_ratio: Decimal,
    #[serde(default)]
    pub copy_mode: CopyMode,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// How a follower's order size is derived from a master signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CopyMode {
    /// Track the follower's own book and trade only the difference to the target.
    #[default]
    Reconcile,
    /// Legacy ratio-only model: resend `|master size| x ratio` on every signal.
    Mirror,
}

impl CopyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CopyMode::Reconcile => "reconcile",
            CopyMode::Mirror => "mirror",
        }
    }
}

impl std::str::FromStr for CopyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reconcile" => Ok(CopyMode::Reconcile),
            "mirror" | "ratio" => Ok(CopyMode::Mirror),
            other => Err(format!("unknown copy mode '{other}'")),
        }
    }
}

impl std::fmt::Display for CopyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_mode_parsing() {
        assert_eq!("reconcile".parse::<CopyMode>(), Ok(CopyMode::Reconcile));
        assert_eq!("MIRROR".parse::<CopyMode>(), Ok(CopyMode::Mirror));
        assert_eq!("ratio".parse::<CopyMode>(), Ok(CopyMode::Mirror));
        assert!("kelly".parse::<CopyMode>().is_err());
    }

    #[test]
    fn test_unknown_stored_mode_falls_back_to_reconcile() {
        let now = Utc::now();
        let config = FollowConfig {
            id: Uuid::new_v4(),
            follower_user_id: 2,
            master_user_id: 1,
            master_credential_id: 10,
            follower_credential_id: 20,
            copy_ratio: Decimal::new(1, 1),
            copy_mode: "garbage".into(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(config.mode(), CopyMode::Reconcile);
        assert_eq!(config.master_key(), (1, 10));
    }
}
