use std::sync::Arc;

use crate::services::credentials::Credentials;

use super::mock::MockExchange;
use super::{ExchangeConnector, ExchangeError};

/// Venue names the factory recognises. Only `mock` has a connector so far.
pub const KNOWN_EXCHANGES: &[&str] = &[
    "mock",
    "binance",
    "binance_testnet",
    "okx",
    "bybit",
    "huobi",
    "kucoin",
    "gate",
    "bitget",
    "mexc",
];

/// Builds a connector for a follower's resolved credentials.
pub trait ConnectorFactory: Send + Sync {
    fn connect(&self, credentials: &Credentials) -> Result<Arc<dyn ExchangeConnector>, ExchangeError>;
}

#[derive(Debug, Clone, Default)]
pub struct DefaultConnectorFactory;

impl DefaultConnectorFactory {
    pub fn is_supported(exchange: &str) -> bool {
        KNOWN_EXCHANGES.contains(&exchange.to_lowercase().as_str())
    }
}

impl ConnectorFactory for DefaultConnectorFactory {
    fn connect(&self, credentials: &Credentials) -> Result<Arc<dyn ExchangeConnector>, ExchangeError> {
        let name = credentials.exchange.to_lowercase();
        match name.as_str() {
            "mock" => Ok(Arc::new(MockExchange::new(credentials))),
            other if Self::is_supported(other) => Err(ExchangeError::NotImplemented(name)),
            _ => Err(ExchangeError::Unsupported(name)),
        }
    }
}
