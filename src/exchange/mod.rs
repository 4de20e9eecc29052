pub mod factory;
pub mod mock;
pub mod types;

pub use factory::{ConnectorFactory, DefaultConnectorFactory};
pub use mock::MockExchange;
pub use types::{
    Balance, ExchangePosition, OpenOrder, OrderDescriptor, OrderRequest, Ticker,
};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("exchange {0} is not supported")]
    Unsupported(String),

    #[error("exchange {0} is not implemented yet")]
    NotImplemented(String),

    #[error("order rejected: {0}")]
    OrderRejected(String),

    #[error("invalid order: {0}")]
    InvalidOrder(String),

    #[error("exchange API error: {0}")]
    Api(String),
}

/// Uniform capability surface over a trading venue.
///
/// The reconciliation executor only ever talks to this trait; venue-specific
/// behaviour lives entirely in the implementations.
#[async_trait]
pub trait ExchangeConnector: Send + Sync {
    /// Short venue id, e.g. `"mock"`.
    fn exchange_id(&self) -> &str;

    async fn fetch_balance(&self) -> Result<Balance, ExchangeError>;

    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, ExchangeError>;

    async fn fetch_open_orders(
        &self,
        symbol: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<OpenOrder>, ExchangeError>;

    async fn create_order(&self, request: &OrderRequest) -> Result<OrderDescriptor, ExchangeError>;

    async fn fetch_positions(
        &self,
        symbols: Option<&[String]>,
    ) -> Result<Vec<ExchangePosition>, ExchangeError>;

    async fn cancel_order(&self, order_id: &str, symbol: &str)
        -> Result<OrderDescriptor, ExchangeError>;
}
