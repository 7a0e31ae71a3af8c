//! Fill: a single executed trade leg reported by an exchange.

use crate::decimal::{parse_decimal, serde_util};
use crate::domain::ids::{OrderId, TradeId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Execution side of a fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[serde(alias = "BUY", alias = "Buy", alias = "b", alias = "B", alias = "bid")]
    Buy,
    #[serde(alias = "SELL", alias = "Sell", alias = "s", alias = "S", alias = "ask")]
    Sell,
}

impl Side {
    /// +1 for buys, -1 for sells.
    pub fn sign(&self) -> f64 {
        match self {
            Side::Buy => 1.0,
            Side::Sell => -1.0,
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, Side::Buy)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// Raw fill record as supplied by an exchange trade-history API.
///
/// Numeric fields stay in their decimal-string form; the accessor methods parse
/// them leniently (see [`parse_decimal`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fill {
    pub trade_id: TradeId,
    #[serde(default)]
    pub order_id: OrderId,
    pub symbol: String,
    pub side: Side,
    #[serde(deserialize_with = "serde_util::decimal_string::deserialize")]
    pub price: String,
    #[serde(deserialize_with = "serde_util::decimal_string::deserialize")]
    pub size: String,
    #[serde(default, deserialize_with = "serde_util::decimal_string::deserialize")]
    pub fee_amount: String,
    #[serde(default)]
    pub fee_currency: String,
    /// Execution time, epoch milliseconds.
    #[serde(deserialize_with = "serde_util::timestamp_ms::deserialize")]
    pub timestamp: i64,
}

impl Fill {
    pub fn price_value(&self) -> f64 {
        parse_decimal(&self.price)
    }

    pub fn size_value(&self) -> f64 {
        parse_decimal(&self.size)
    }

    /// Fee magnitude. Exchanges disagree on the sign of fees, so it is dropped.
    pub fn fee_value(&self) -> f64 {
        parse_decimal(&self.fee_amount).abs()
    }

    /// Gross notional in quote currency: `size * price`.
    pub fn notional(&self) -> f64 {
        self.size_value() * self.price_value()
    }

    /// Signed contribution to net position (base units).
    pub fn signed_size(&self) -> f64 {
        self.side.sign() * self.size_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_exchange_shape() {
        let json = r#"{
            "tradeId": "t-1",
            "orderId": "o-1",
            "symbol": "BTC-USDT",
            "side": "buy",
            "price": "40000.5",
            "size": "0.25",
            "feeAmount": "10",
            "feeCurrency": "USDT",
            "timestamp": 1704067200000
        }"#;
        let fill: Fill = serde_json::from_str(json).unwrap();
        assert_eq!(fill.trade_id, TradeId::from("t-1"));
        assert_eq!(fill.side, Side::Buy);
        assert_eq!(fill.price_value(), 40000.5);
        assert_eq!(fill.size_value(), 0.25);
        assert_eq!(fill.fee_value(), 10.0);
        assert_eq!(fill.timestamp, 1_704_067_200_000);
    }

    #[test]
    fn accepts_numbers_and_uppercase_side() {
        let json = r#"{
            "tradeId": "7",
            "symbol": "ETHUSDT",
            "side": "SELL",
            "price": 2500,
            "size": 1.5,
            "timestamp": "1704067200000"
        }"#;
        let fill: Fill = serde_json::from_str(json).unwrap();
        assert_eq!(fill.side, Side::Sell);
        assert_eq!(fill.price_value(), 2500.0);
        assert_eq!(fill.size_value(), 1.5);
        assert_eq!(fill.fee_value(), 0.0);
        assert!(fill.fee_currency.is_empty());
        assert_eq!(fill.signed_size(), -1.5);
    }

    #[test]
    fn negative_fee_is_taken_as_magnitude() {
        let json = r#"{
            "tradeId": "x", "symbol": "BTC-USDT", "side": "b",
            "price": "1", "size": "1", "feeAmount": "-0.5", "feeCurrency": "USDT",
            "timestamp": 0
        }"#;
        let fill: Fill = serde_json::from_str(json).unwrap();
        assert_eq!(fill.fee_value(), 0.5);
    }

    #[test]
    fn bad_timestamp_is_rejected() {
        let json = r#"{
            "tradeId": "x", "symbol": "BTC-USDT", "side": "buy",
            "price": "1", "size": "1", "timestamp": "yesterday"
        }"#;
        assert!(serde_json::from_str::<Fill>(json).is_err());
    }
}
