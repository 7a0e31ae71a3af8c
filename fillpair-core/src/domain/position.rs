//! Position: one open-to-close trading cycle reconstructed from fills.

use super::fill::Fill;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether the position's net exposure returned to flat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionStatus {
    /// Net exposure returned to (approximately) zero.
    Closed,
    /// Trailing leftovers at the end of the fill stream; still open.
    Pending,
}

impl fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionStatus::Closed => write!(f, "closed"),
            PositionStatus::Pending => write!(f, "pending"),
        }
    }
}

/// A group of fills representing one round trip, with fee-adjusted economics.
///
/// `pnl` and `pnl_percent` are `None` whenever they cannot be computed from the
/// legs present (one-sided position, zero sizes). That is a signal, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub date_range: String,
    pub status: PositionStatus,
    /// Earliest fill timestamp (epoch ms).
    pub opened_at: i64,
    /// Latest fill timestamp (epoch ms).
    pub closed_at: i64,

    // ── Legs ──
    pub buys: Vec<Fill>,
    pub sells: Vec<Fill>,

    // ── Buy side ──
    pub total_buy_size: f64,
    pub total_buy_cost: f64,
    pub avg_buy_price: Option<f64>,

    // ── Sell side ──
    pub total_sell_size: f64,
    pub total_sell_revenue: f64,
    pub avg_sell_price: Option<f64>,

    // ── Result ──
    pub pnl: Option<f64>,
    pub pnl_percent: Option<f64>,
}

impl Position {
    pub fn fill_count(&self) -> usize {
        self.buys.len() + self.sells.len()
    }

    pub fn is_closed(&self) -> bool {
        self.status == PositionStatus::Closed
    }

    /// Net base-asset exposure left in the position (fee-adjusted buys minus sells).
    pub fn open_size(&self) -> f64 {
        self.total_buy_size - self.total_sell_size
    }

    pub fn is_winner(&self) -> bool {
        self.pnl.is_some_and(|pnl| pnl > 0.0)
    }

    /// All legs in chronological order.
    pub fn fills(&self) -> Vec<&Fill> {
        let mut all: Vec<&Fill> = self.buys.iter().chain(self.sells.iter()).collect();
        all.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.trade_id.cmp(&b.trade_id))
        });
        all
    }
}
