use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{OrderType, Side};

/// Account balances per currency.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Balance {
    pub total: HashMap<String, Decimal>,
    pub free: HashMap<String, Decimal>,
    pub used: HashMap<String, Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    pub last: Decimal,
    pub bid: Decimal,
    pub ask: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub volume: Decimal,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenOrder {
    pub id: String,
    pub symbol: String,
    pub order_type: OrderType,
    pub side: Side,
    pub price: Option<Decimal>,
    pub amount: Decimal,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub symbol: String,
    pub order_type: OrderType,
    pub side: Side,
    pub amount: Decimal,
    /// Required for limit orders, ignored for market orders.
    pub price: Option<Decimal>,
}

impl OrderRequest {
    pub fn market(symbol: &str, side: Side, amount: Decimal) -> Self {
        Self {
            symbol: symbol.to_string(),
            order_type: OrderType::Market,
            side,
            amount,
            price: None,
        }
    }
}

/// What a venue reports back for a created or cancelled order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDescriptor {
    pub id: String,
    pub client_order_id: Option<String>,
    pub symbol: String,
    pub order_type: Option<OrderType>,
    pub side: Option<Side>,
    pub price: Option<Decimal>,
    pub amount: Decimal,
    pub filled: Decimal,
    pub remaining: Decimal,
    pub cost: Decimal,
    pub fee: Option<Decimal>,
    pub fee_currency: Option<String>,
    /// Venue status string, e.g. `"closed"` or `"canceled"`.
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangePosition {
    pub symbol: String,
    /// `"long"` or `"short"`.
    pub side: String,
    pub contracts: Decimal,
    pub contract_size: Decimal,
    pub entry_price: Decimal,
    pub mark_price: Decimal,
    pub notional: Decimal,
    pub leverage: u32,
    pub unrealized_pnl: Decimal,
    pub percentage: Decimal,
    pub timestamp: DateTime<Utc>,
}
