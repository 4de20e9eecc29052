use std::env;
use std::time::Duration;

use crate::engine::{DetectorMode, EngineConfig};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,

    // Engine
    pub poll_interval_secs: u64,
    pub detector_mode: DetectorMode,
    pub engine_autostart: bool,

    // Telegram (optional)
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub notifications_enabled: bool,

    /// Bearer token for `/api/*`. Empty disables auth.
    pub api_token: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup so parsing can be tested without
    /// touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let detector_raw = lookup("CHANGE_DETECTOR_MODE").unwrap_or_else(|| "memory".into());
        let detector_mode: DetectorMode = detector_raw
            .parse()
            .map_err(|e| anyhow::anyhow!("CHANGE_DETECTOR_MODE: {e}"))?;

        let poll_interval_secs: u64 = lookup("POLL_INTERVAL_SECS")
            .unwrap_or_else(|| "3".into())
            .parse()?;
        if poll_interval_secs == 0 {
            anyhow::bail!("POLL_INTERVAL_SECS must be at least 1");
        }

        Ok(Self {
            database_url: lookup("DATABASE_URL")
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: lookup("PORT").unwrap_or_else(|| "8080".into()).parse()?,

            poll_interval_secs,
            detector_mode,
            engine_autostart: lookup("ENGINE_AUTOSTART")
                .unwrap_or_else(|| "true".into())
                .parse()
                .unwrap_or(true),

            telegram_bot_token: lookup("TELEGRAM_BOT_TOKEN").filter(|s| !s.is_empty()),
            telegram_chat_id: lookup("TELEGRAM_CHAT_ID").filter(|s| !s.is_empty()),
            notifications_enabled: lookup("NOTIFICATIONS_ENABLED")
                .unwrap_or_else(|| "false".into())
                .parse()
                .unwrap_or(false),

            api_token: lookup("API_TOKEN").unwrap_or_default(),
        })
    }

    /// Returns true if Telegram is enabled and both token and chat id are set.
    pub fn has_telegram(&self) -> bool {
        self.notifications_enabled
            && self.telegram_bot_token.is_some()
            && self.telegram_chat_id.is_some()
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            detector_mode: self.detector_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn parse(vars: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[("DATABASE_URL", "postgres://localhost/copybot")]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.poll_interval_secs, 3);
        assert_eq!(config.detector_mode, DetectorMode::InMemory);
        assert!(config.engine_autostart);
        assert!(!config.has_telegram());
        assert!(config.api_token.is_empty());
        assert_eq!(config.engine_config().poll_interval, Duration::from_secs(3));
    }

    #[test]
    fn test_database_url_required() {
        assert!(parse(&[]).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = parse(&[
            ("DATABASE_URL", "postgres://localhost/copybot"),
            ("POLL_INTERVAL_SECS", "10"),
            ("CHANGE_DETECTOR_MODE", "persisted"),
            ("ENGINE_AUTOSTART", "false"),
            ("TELEGRAM_BOT_TOKEN", "bot"),
            ("TELEGRAM_CHAT_ID", "chat"),
            ("NOTIFICATIONS_ENABLED", "true"),
        ])
        .unwrap();
        assert_eq!(config.poll_interval_secs, 10);
        assert_eq!(config.detector_mode, DetectorMode::Persisted);
        assert!(!config.engine_autostart);
        assert!(config.has_telegram());
    }

    #[test]
    fn test_rejects_bad_values() {
        let base = ("DATABASE_URL", "postgres://localhost/copybot");
        assert!(parse(&[base, ("CHANGE_DETECTOR_MODE", "redis")]).is_err());
        assert!(parse(&[base, ("POLL_INTERVAL_SECS", "0")]).is_err());
        assert!(parse(&[base, ("PORT", "http")]).is_err());
    }
}
