//! Trade pairing: converts raw fills into round-trip positions.
//!
//! Pure function: fills + config → positions. The caller's slice is never
//! reordered; fills are copied into the positions that own them.

use super::config::{PairingConfig, SymbolPolicy};
use super::metrics::{compute_position, MetricsContext};
use crate::domain::{Fill, Market, Position, PositionStatus, Side, TradeId};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PairingError {
    #[error("fill {trade_id} has symbol '{found}', expected '{expected}'")]
    MixedSymbols {
        expected: String,
        found: String,
        trade_id: TradeId,
    },
}

/// Fills accumulated since the last flat point.
#[derive(Debug, Default)]
struct OpenCycle {
    net_position: f64,
    buys: Vec<Fill>,
    sells: Vec<Fill>,
}

impl OpenCycle {
    fn push(&mut self, fill: &Fill) {
        let size = fill.size_value();
        match fill.side {
            Side::Buy => {
                self.net_position += size;
                self.buys.push(fill.clone());
            }
            Side::Sell => {
                self.net_position -= size;
                self.sells.push(fill.clone());
            }
        }
    }

    /// Flat within tolerance, with at least one leg on each side.
    fn is_closed(&self, tolerance: f64) -> bool {
        self.net_position.abs() < tolerance && !self.buys.is_empty() && !self.sells.is_empty()
    }

    fn is_empty(&self) -> bool {
        self.buys.is_empty() && self.sells.is_empty()
    }

    /// Hand over the legs and reset to flat.
    fn take(&mut self) -> (Vec<Fill>, Vec<Fill>) {
        self.net_position = 0.0;
        (
            std::mem::take(&mut self.buys),
            std::mem::take(&mut self.sells),
        )
    }
}

/// Chronological view of `fills`: timestamp, then trade id, then input order.
pub fn sort_chronologically(fills: &[Fill]) -> Vec<&Fill> {
    let mut ordered: Vec<&Fill> = fills.iter().collect();
    // `sort_by` is stable, so equal (timestamp, trade_id) keep input order.
    ordered.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.trade_id.cmp(&b.trade_id))
    });
    ordered
}

/// Market used to classify fees: the configured one, else parsed from the
/// earliest fill's symbol.
pub fn resolve_market(ordered: &[&Fill], config: &PairingConfig) -> Option<Market> {
    config
        .market
        .clone()
        .or_else(|| ordered.first().and_then(|f| Market::parse(&f.symbol).ok()))
}

/// Pair fills for a single symbol into positions, most recent first.
///
/// A position closes as soon as the running net position is within
/// `config.tolerance` of zero and it holds at least one buy and one sell.
/// Leftover fills at the end form a single [`PositionStatus::Pending`] position.
/// Every input fill ends up in exactly one position.
///
/// The symbol of each fill is not checked; see [`try_pair_trades`].
pub fn pair_trades(fills: &[Fill], config: &PairingConfig) -> Vec<Position> {
    let ordered = sort_chronologically(fills);
    let market = resolve_market(&ordered, config);
    let ctx = MetricsContext::new(market.as_ref(), config.calendar());
    let tolerance = config.effective_tolerance();

    let mut positions = Vec::new();
    let mut cycle = OpenCycle::default();

    for fill in ordered {
        cycle.push(fill);
        if cycle.is_closed(tolerance) {
            let (buys, sells) = cycle.take();
            positions.push(compute_position(buys, sells, PositionStatus::Closed, &ctx));
        }
    }

    if !cycle.is_empty() {
        let (buys, sells) = cycle.take();
        positions.push(compute_position(buys, sells, PositionStatus::Pending, &ctx));
    }

    positions.reverse();
    positions
}

/// [`pair_trades`] with the configured [`SymbolPolicy`] enforced.
pub fn try_pair_trades(
    fills: &[Fill],
    config: &PairingConfig,
) -> Result<Vec<Position>, PairingError> {
    if config.symbol_policy == SymbolPolicy::Strict {
        check_single_symbol(fills)?;
    }
    Ok(pair_trades(fills, config))
}

/// Error on the first fill whose symbol differs from the first fill's.
pub fn check_single_symbol(fills: &[Fill]) -> Result<(), PairingError> {
    let Some(first) = fills.first() else {
        return Ok(());
    };
    match fills.iter().find(|f| f.symbol != first.symbol) {
        Some(other) => Err(PairingError::MixedSymbols {
            expected: first.symbol.clone(),
            found: other.symbol.clone(),
            trade_id: other.trade_id.clone(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderId;

    const DAY1: i64 = 1_704_448_800_000; // 2024-01-05T10:00Z
    const HOUR: i64 = 3_600_000;
    const DAY: i64 = 24 * HOUR;

    fn make_fill(id: &str, side: Side, price: &str, size: &str, ts: i64) -> Fill {
        Fill {
            trade_id: TradeId::from(id),
            order_id: OrderId::from(id),
            symbol: "BTC-USDT".into(),
            side,
            price: price.into(),
            size: size.into(),
            fee_amount: String::new(),
            fee_currency: String::new(),
            timestamp: ts,
        }
    }

    fn buy(id: &str, price: &str, size: &str, ts: i64) -> Fill {
        make_fill(id, Side::Buy, price, size, ts)
    }

    fn sell(id: &str, price: &str, size: &str, ts: i64) -> Fill {
        make_fill(id, Side::Sell, price, size, ts)
    }

    fn pair(fills: &[Fill]) -> Vec<Position> {
        pair_trades(fills, &PairingConfig::default())
    }

    #[test]
    fn zero_fills_produces_zero_positions() {
        assert!(pair(&[]).is_empty());
    }

    #[test]
    fn single_round_trip() {
        let positions = pair(&[
            buy("1", "40000", "1", DAY1),
            sell("2", "41000", "1", DAY1 + HOUR),
        ]);
        assert_eq!(positions.len(), 1);
        let p = &positions[0];
        assert_eq!(p.status, PositionStatus::Closed);
        assert_eq!(p.date_range, "Jan 5");
        assert!((p.pnl.unwrap() - 1000.0).abs() < 1e-9);
        assert!((p.pnl_percent.unwrap() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn unsorted_input_is_sorted_before_pairing() {
        let positions = pair(&[
            sell("2", "41000", "1", DAY1 + HOUR),
            buy("1", "40000", "1", DAY1),
        ]);
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].buys[0].trade_id, TradeId::from("1"));
        assert!((positions[0].pnl.unwrap() - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn short_first_cycle_closes_on_buy_back() {
        let positions = pair(&[
            sell("1", "110", "2", DAY1),
            buy("2", "100", "2", DAY1 + HOUR),
        ]);
        assert_eq!(positions.len(), 1);
        assert!(positions[0].is_closed());
        // revenue 220 - basis 2*100
        assert_eq!(positions[0].pnl, Some(20.0));
    }

    #[test]
    fn partial_fills_accumulate_until_flat() {
        let positions = pair(&[
            buy("1", "100", "1", DAY1),
            sell("2", "105", "0.4", DAY1 + HOUR),
            sell("3", "106", "0.6", DAY1 + 2 * HOUR),
        ]);
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].sells.len(), 2);
        assert!(positions[0].is_closed());
    }

    #[test]
    fn residual_within_tolerance_closes() {
        let positions = pair(&[
            buy("1", "100", "1.0000", DAY1),
            sell("2", "101", "0.9995", DAY1 + HOUR),
        ]);
        assert_eq!(positions.len(), 1);
        assert!(positions[0].is_closed());
    }

    #[test]
    fn residual_outside_tolerance_stays_pending() {
        let positions = pair(&[
            buy("1", "100", "1.0", DAY1),
            sell("2", "101", "0.99", DAY1 + HOUR),
        ]);
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].status, PositionStatus::Pending);
        // Both legs present, so the matched part still has a pnl.
        assert!(positions[0].pnl.is_some());
    }

    #[test]
    fn tighter_tolerance_keeps_position_open() {
        let config = PairingConfig::default().with_tolerance(1e-6);
        let positions = pair_trades(
            &[
                buy("1", "100", "1.0000", DAY1),
                sell("2", "101", "0.9995", DAY1 + HOUR),
            ],
            &config,
        );
        assert_eq!(positions[0].status, PositionStatus::Pending);
    }

    #[test]
    fn trailing_open_buys_form_pending_position() {
        let positions = pair(&[
            buy("1", "100", "1", DAY1),
            sell("2", "110", "1", DAY1 + HOUR),
            buy("3", "105", "2", DAY1 + DAY),
        ]);
        assert_eq!(positions.len(), 2);
        // Most recent first.
        assert_eq!(positions[0].status, PositionStatus::Pending);
        assert!(positions[0].sells.is_empty());
        assert_eq!(positions[0].pnl, None);
        assert_eq!(positions[1].status, PositionStatus::Closed);
    }

    #[test]
    fn positions_are_returned_most_recent_first() {
        let positions = pair(&[
            buy("1", "100", "1", DAY1),
            sell("2", "101", "1", DAY1 + HOUR),
            buy("3", "100", "1", DAY1 + DAY),
            sell("4", "102", "1", DAY1 + DAY + HOUR),
            buy("5", "100", "1", DAY1 + 2 * DAY),
            sell("6", "103", "1", DAY1 + 2 * DAY + HOUR),
        ]);
        assert_eq!(positions.len(), 3);
        assert_eq!(positions[0].pnl, Some(3.0));
        assert_eq!(positions[1].pnl, Some(2.0));
        assert_eq!(positions[2].pnl, Some(1.0));
        assert!(positions[0].opened_at > positions[1].opened_at);
    }

    #[test]
    fn equal_timestamps_tie_break_on_trade_id() {
        // Same instant: "a" (sell) sorts before "b" (buy), so the cycle opens short.
        let positions = pair(&[
            buy("b", "100", "1", DAY1),
            sell("a", "101", "1", DAY1),
        ]);
        assert_eq!(positions.len(), 1);
        let fills = positions[0].fills();
        let legs: Vec<&str> = fills.iter().map(|f| f.trade_id.as_str()).collect();
        assert_eq!(legs, vec!["a", "b"]);
    }

    #[test]
    fn input_slice_is_not_reordered() {
        let fills = vec![
            sell("2", "41000", "1", DAY1 + HOUR),
            buy("1", "40000", "1", DAY1),
        ];
        let before = fills.clone();
        let _ = pair(&fills);
        assert_eq!(fills, before);
    }

    #[test]
    fn zero_size_fill_does_not_close_alone() {
        let positions = pair(&[buy("1", "100", "0", DAY1)]);
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].status, PositionStatus::Pending);
        assert_eq!(positions[0].avg_buy_price, None);
    }

    #[test]
    fn strict_policy_rejects_mixed_symbols() {
        let mut other = sell("2", "10", "1", DAY1 + HOUR);
        other.symbol = "ETH-USDT".into();
        let fills = vec![buy("1", "10", "1", DAY1), other];

        let config = PairingConfig::default().with_symbol_policy(SymbolPolicy::Strict);
        let err = try_pair_trades(&fills, &config).unwrap_err();
        assert_eq!(
            err,
            PairingError::MixedSymbols {
                expected: "BTC-USDT".into(),
                found: "ETH-USDT".into(),
                trade_id: TradeId::from("2"),
            }
        );

        // Default policy blends them silently.
        let positions = try_pair_trades(&fills, &PairingConfig::default()).unwrap();
        assert_eq!(positions.len(), 1);
    }

    #[test]
    fn configured_market_overrides_symbol() {
        let mut b = buy("1", "100", "1", DAY1);
        b.symbol = "weird".into();
        b.fee_amount = "1".into();
        b.fee_currency = "USDT".into();
        let mut s = sell("2", "110", "1", DAY1 + HOUR);
        s.symbol = "weird".into();

        let without = pair(&[b.clone(), s.clone()]);
        assert_eq!(without[0].total_buy_cost, 100.0);

        let config = PairingConfig::default().with_market(Market::new("BTC", "USDT").unwrap());
        let with = pair_trades(&[b, s], &config);
        assert_eq!(with[0].total_buy_cost, 101.0);
    }
}
