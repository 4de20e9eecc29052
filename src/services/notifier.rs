use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::json;

use crate::models::Side;

/// A follower order that filled.
#[derive(Debug, Clone)]
pub struct TradeSuccess {
    pub follower_user_id: i64,
    pub symbol: String,
    pub side: Side,
    pub amount: Decimal,
    pub price: Option<Decimal>,
    pub order_id: String,
}

/// A follower reconciliation that failed and suspended copying.
#[derive(Debug, Clone)]
pub struct TradeFailure {
    pub follower_user_id: i64,
    pub error_type: String,
    pub error_message: String,
    pub context: serde_json::Value,
}

/// Outbound notification channel. Callers treat every call as fire-and-forget.
#[async_trait]
pub trait TradeNotifier: Send + Sync {
    async fn notify_trade_success(&self, event: &TradeSuccess) -> anyhow::Result<()>;

    async fn notify_error(&self, event: &TradeFailure) -> anyhow::Result<()>;
}

/// Telegram notification service.
#[derive(Debug, Clone)]
pub struct Notifier {
    http: reqwest::Client,
    bot_token: String,
    chat_id: String,
}

impl Notifier {
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            bot_token,
            chat_id,
        }
    }

    /// Send a Telegram message. Non-2xx responses are returned as errors.
    pub async fn send(&self, message: &str) -> anyhow::Result<()> {
        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            self.bot_token
        );

        let body = json!({
            "chat_id": self.chat_id,
            "text": message,
            "parse_mode": "Markdown",
        });

        let resp = self.http.post(&url).json(&body).send().await?;
        if !resp.status().is_success() {
            anyhow::bail!("Telegram sendMessage returned {}", resp.status());
        }

        Ok(())
    }
}

#[async_trait]
impl TradeNotifier for Notifier {
    async fn notify_trade_success(&self, event: &TradeSuccess) -> anyhow::Result<()> {
        self.send(&format_trade_success(event)).await
    }

    async fn notify_error(&self, event: &TradeFailure) -> anyhow::Result<()> {
        self.send(&format_trade_failure(event)).await
    }
}

/// Format a filled follower order.
pub fn format_trade_success(event: &TradeSuccess) -> String {
    let price = event
        .price
        .map(|p| p.round_dp(2).to_string())
        .unwrap_or_else(|| "market".into());

    format!(
        "*Copy Trade Filled*\nFollower: {}\nSymbol: {}\nSide: {}\nAmount: {}\nPrice: {}\nOrder: `{}`",
        event.follower_user_id,
        event.symbol,
        event.side.as_str().to_uppercase(),
        event.amount.normalize(),
        price,
        event.order_id,
    )
}

/// Format a failure alert. Context keys are listed in their JSON order.
pub fn format_trade_failure(event: &TradeFailure) -> String {
    let mut msg = format!(
        "*Copy Trading Suspended*\nFollower: {}\nError type: {}\nError: `{}`",
        event.follower_user_id, event.error_type, event.error_message,
    );

    if let Some(obj) = event.context.as_object() {
        if !obj.is_empty() {
            msg.push_str("\nDetails:");
            for (key, value) in obj {
                msg.push_str(&format!("\n  • {key}: {value}"));
            }
        }
    }

    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_trade_success() {
        let msg = format_trade_success(&TradeSuccess {
            follower_user_id: 7,
            symbol: "BTC/USDT".into(),
            side: Side::Sell,
            amount: Decimal::new(150, 2),
            price: Some(Decimal::new(5000012345, 5)),
            order_id: "abc-123".into(),
        });

        assert!(msg.contains("Follower: 7"));
        assert!(msg.contains("Side: SELL"));
        assert!(msg.contains("Amount: 1.5"));
        assert!(msg.contains("Price: 50000.12"));
        assert!(msg.contains("`abc-123`"));
    }

    #[test]
    fn test_format_trade_failure_lists_context() {
        let msg = format_trade_failure(&TradeFailure {
            follower_user_id: 3,
            error_type: "exchange_error".into(),
            error_message: "order rejected: insufficient margin".into(),
            context: json!({ "symbol": "ETH/USDT", "amount": "0.5" }),
        });

        assert!(msg.contains("Suspended"));
        assert!(msg.contains("exchange_error"));
        assert!(msg.contains("symbol: \"ETH/USDT\""));
        assert!(msg.contains("amount: \"0.5\""));
    }
}
