use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{OrderType, Side};
use crate::services::credentials::Credentials;

use super::types::{Balance, ExchangePosition, OpenOrder, OrderDescriptor, OrderRequest, Ticker};
use super::{ExchangeConnector, ExchangeError};

/// Price used for any symbol missing from the table.
const DEFAULT_PRICE: i64 = 50_000;

/// Deterministic in-memory venue. Never touches the network; every order is
/// filled immediately and completely.
#[derive(Debug, Clone)]
pub struct MockExchange {
    api_key: String,
    prices: HashMap<String, Decimal>,
}

impl MockExchange {
    pub fn new(credentials: &Credentials) -> Self {
        let prices = HashMap::from([
            ("BTC/USDT".to_string(), Decimal::from(50_000)),
            ("ETH/USDT".to_string(), Decimal::from(3_000)),
            ("BNB/USDT".to_string(), Decimal::from(400)),
            ("SOL/USDT".to_string(), Decimal::from(100)),
        ]);

        tracing::debug!(api_key = %mask_key(&credentials.api_key), "MockExchange created");

        Self {
            api_key: credentials.api_key.clone(),
            prices,
        }
    }

    pub fn set_price(&mut self, symbol: &str, price: Decimal) {
        self.prices.insert(symbol.to_string(), price);
    }

    pub fn price(&self, symbol: &str) -> Decimal {
        self.prices
            .get(symbol)
            .copied()
            .unwrap_or_else(|| Decimal::from(DEFAULT_PRICE))
    }
}

fn mask_key(key: &str) -> String {
    format!("{}...", key.chars().take(8).collect::<String>())
}

fn balances(pairs: &[(&str, i64, u32)]) -> HashMap<String, Decimal> {
    pairs
        .iter()
        .map(|(ccy, num, scale)| (ccy.to_string(), Decimal::new(*num, *scale)))
        .collect()
}

#[async_trait]
impl ExchangeConnector for MockExchange {
    fn exchange_id(&self) -> &str {
        "mock"
    }

    async fn fetch_balance(&self) -> Result<Balance, ExchangeError> {
        Ok(Balance {
            total: balances(&[("USDT", 10_000, 0), ("BTC", 5, 1), ("ETH", 5, 0), ("BNB", 10, 0)]),
            free: balances(&[("USDT", 8_000, 0), ("BTC", 3, 1), ("ETH", 3, 0), ("BNB", 8, 0)]),
            used: balances(&[("USDT", 2_000, 0), ("BTC", 2, 1), ("ETH", 2, 0), ("BNB", 2, 0)]),
        })
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, ExchangeError> {
        let last = self.price(symbol);
        Ok(Ticker {
            symbol: symbol.to_string(),
            last,
            bid: last * Decimal::new(9999, 4),
            ask: last * Decimal::new(10001, 4),
            high: last * Decimal::new(105, 2),
            low: last * Decimal::new(95, 2),
            volume: Decimal::from(1_000),
            timestamp: Utc::now(),
        })
    }

    async fn fetch_open_orders(
        &self,
        symbol: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<OpenOrder>, ExchangeError> {
        let orders = vec![OpenOrder {
            id: Uuid::new_v4().to_string(),
            symbol: symbol.unwrap_or("BTC/USDT").to_string(),
            order_type: OrderType::Limit,
            side: Side::Buy,
            price: Some(Decimal::from(50_000)),
            amount: Decimal::new(1, 1),
            status: "open".into(),
            timestamp: Utc::now(),
        }];

        Ok(orders.into_iter().take(limit.unwrap_or(usize::MAX)).collect())
    }

    async fn create_order(&self, request: &OrderRequest) -> Result<OrderDescriptor, ExchangeError> {
        if request.amount <= Decimal::ZERO {
            return Err(ExchangeError::InvalidOrder(format!(
                "amount must be positive, got {}",
                request.amount
            )));
        }
        if request.order_type == OrderType::Limit && request.price.is_none() {
            return Err(ExchangeError::InvalidOrder("limit order requires a price".into()));
        }

        let id = Uuid::new_v4().to_string();
        let execution_price = request.price.unwrap_or_else(|| self.price(&request.symbol));
        let (cost, fee) = execution_price
            .checked_mul(request.amount)
            .and_then(|cost| cost.checked_mul(Decimal::new(1, 3)).map(|fee| (cost, fee)))
            .ok_or_else(|| {
                ExchangeError::InvalidOrder(format!(
                    "notional out of range: {} x {}",
                    request.amount, execution_price
                ))
            })?;

        tracing::info!(
            symbol = %request.symbol,
            order_type = %request.order_type,
            side = %request.side,
            amount = %request.amount,
            price = %execution_price,
            api_key = %mask_key(&self.api_key),
            "MockExchange order filled"
        );

        Ok(OrderDescriptor {
            client_order_id: Some(format!("mock_{}", &id[..8])),
            id,
            symbol: request.symbol.clone(),
            order_type: Some(request.order_type),
            side: Some(request.side),
            price: Some(execution_price),
            amount: request.amount,
            filled: request.amount,
            remaining: Decimal::ZERO,
            cost,
            fee: Some(fee),
            fee_currency: Some("USDT".into()),
            status: "closed".into(),
            timestamp: Utc::now(),
        })
    }

    async fn fetch_positions(
        &self,
        symbols: Option<&[String]>,
    ) -> Result<Vec<ExchangePosition>, ExchangeError> {
        let positions = vec![ExchangePosition {
            symbol: "BTC/USDT".into(),
            side: "long".into(),
            contracts: Decimal::new(5, 1),
            contract_size: Decimal::ONE,
            entry_price: Decimal::from(48_000),
            mark_price: Decimal::from(50_000),
            notional: Decimal::from(25_000),
            leverage: 10,
            unrealized_pnl: Decimal::from(1_000),
            percentage: Decimal::new(417, 2),
            timestamp: Utc::now(),
        }];

        Ok(match symbols {
            Some(wanted) => positions
                .into_iter()
                .filter(|p| wanted.iter().any(|s| s == &p.symbol))
                .collect(),
            None => positions,
        })
    }

    async fn cancel_order(
        &self,
        order_id: &str,
        symbol: &str,
    ) -> Result<OrderDescriptor, ExchangeError> {
        tracing::info!(order_id, symbol, "MockExchange order cancelled");
        Ok(OrderDescriptor {
            id: order_id.to_string(),
            client_order_id: None,
            symbol: symbol.to_string(),
            order_type: None,
            side: None,
            price: None,
            amount: Decimal::ZERO,
            filled: Decimal::ZERO,
            remaining: Decimal::ZERO,
            cost: Decimal::ZERO,
            fee: None,
            fee_currency: None,
            status: "canceled".into(),
            timestamp: Utc::now(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
