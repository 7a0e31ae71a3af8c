//! fillpair core: fill domain types and the trade-pairing / realized-PnL engine.
//!
//! This crate contains:
//! - Domain types (fills, sides, markets, positions, ids)
//! - Lenient decimal parsing for exchange-supplied numeric strings
//! - The pairing scan that groups fills into round-trip positions
//! - Fee-adjusted cost basis, revenue and PnL per position
//! - Calendar helpers for date-range labels and moved-leg detection
//! - Summary statistics over positions
//!
//! No I/O and no process-wide state: every call owns its working buffers.

pub mod decimal;
pub mod domain;
pub mod engine;
pub mod summary;

pub use domain::{Fill, Market, Position, PositionStatus, Side};
pub use engine::{
    day_of_month, is_moved_order, pair_trades, try_pair_trades, PairingConfig, PairingError,
};
pub use summary::PairingSummary;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything a caller may hand to another thread is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Fill>();
        require_sync::<domain::Fill>();
        require_send::<domain::Position>();
        require_sync::<domain::Position>();
        require_send::<domain::Market>();
        require_sync::<domain::Market>();
        require_send::<domain::TradeId>();
        require_sync::<domain::TradeId>();
        require_send::<engine::PairingConfig>();
        require_sync::<engine::PairingConfig>();
        require_send::<engine::Calendar>();
        require_sync::<engine::Calendar>();
        require_send::<engine::PairingError>();
        require_sync::<engine::PairingError>();
        require_send::<summary::PairingSummary>();
        require_sync::<summary::PairingSummary>();
    }

    #[test]
    fn public_api_pairs_a_round_trip() {
        let json = r#"[
            {"tradeId":"1","symbol":"BTC-USDT","side":"buy","price":"100","size":"1","timestamp":0},
            {"tradeId":"2","symbol":"BTC-USDT","side":"sell","price":"110","size":"1","timestamp":1}
        ]"#;
        let fills: Vec<Fill> = serde_json::from_str(json).unwrap();
        let positions = pair_trades(&fills, &PairingConfig::default());
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].pnl, Some(10.0));
        assert_eq!(positions[0].date_range, "Jan 1");
    }
}
