//! Summary statistics over a set of positions: pure functions.

use crate::domain::Position;
use serde::{Deserialize, Serialize};

/// Aggregate realized economics for a list of positions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingSummary {
    pub position_count: usize,
    pub closed_count: usize,
    pub pending_count: usize,
    pub fill_count: usize,
    /// Sum of `pnl` over closed positions that have one.
    pub realized_pnl: f64,
    pub winners: usize,
    pub losers: usize,
    /// Winners / (winners + losers); 0 when no closed position has a pnl.
    pub win_rate: f64,
    pub best_pnl: Option<f64>,
    pub worst_pnl: Option<f64>,
    /// Mean `pnl_percent` over closed positions that have one.
    pub avg_pnl_percent: Option<f64>,
    /// Number of closed positions that contributed to `avg_pnl_percent`.
    pub priced_count: usize,
    pub total_buy_cost: f64,
    pub total_sell_revenue: f64,
}

impl PairingSummary {
    pub fn compute(positions: &[Position]) -> Self {
        let closed: Vec<&Position> = positions.iter().filter(|p| p.is_closed()).collect();
        let pnls: Vec<f64> = closed.iter().filter_map(|p| p.pnl).collect();
        let percents: Vec<f64> = closed.iter().filter_map(|p| p.pnl_percent).collect();

        let winners = pnls.iter().filter(|&&pnl| pnl > 0.0).count();
        let losers = pnls.iter().filter(|&&pnl| pnl < 0.0).count();
        let decided = winners + losers;

        Self {
            position_count: positions.len(),
            closed_count: closed.len(),
            pending_count: positions.len() - closed.len(),
            fill_count: positions.iter().map(Position::fill_count).sum(),
            realized_pnl: pnls.iter().sum(),
            winners,
            losers,
            win_rate: if decided > 0 {
                winners as f64 / decided as f64
            } else {
                0.0
            },
            best_pnl: pnls.iter().copied().reduce(f64::max),
            worst_pnl: pnls.iter().copied().reduce(f64::min),
            avg_pnl_percent: (!percents.is_empty())
                .then(|| percents.iter().sum::<f64>() / percents.len() as f64),
            priced_count: percents.len(),
            total_buy_cost: positions.iter().map(|p| p.total_buy_cost).sum(),
            total_sell_revenue: positions.iter().map(|p| p.total_sell_revenue).sum(),
        }
    }

    /// Fold several summaries (e.g. one per symbol) into one.
    pub fn combine<'a, I>(parts: I) -> Self
    where
        I: IntoIterator<Item = &'a PairingSummary>,
    {
        let mut out = Self::default();
        let mut percent_sum = 0.0;

        for part in parts {
            out.position_count += part.position_count;
            out.closed_count += part.closed_count;
            out.pending_count += part.pending_count;
            out.fill_count += part.fill_count;
            out.realized_pnl += part.realized_pnl;
            out.winners += part.winners;
            out.losers += part.losers;
            out.best_pnl = max_opt(out.best_pnl, part.best_pnl);
            out.worst_pnl = min_opt(out.worst_pnl, part.worst_pnl);
            out.total_buy_cost += part.total_buy_cost;
            out.total_sell_revenue += part.total_sell_revenue;
            if let Some(avg) = part.avg_pnl_percent {
                percent_sum += avg * part.priced_count as f64;
                out.priced_count += part.priced_count;
            }
        }

        let decided = out.winners + out.losers;
        out.win_rate = if decided > 0 {
            out.winners as f64 / decided as f64
        } else {
            0.0
        };
        out.avg_pnl_percent =
            (out.priced_count > 0).then(|| percent_sum / out.priced_count as f64);
        out
    }
}

fn max_opt(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

fn min_opt(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, None) => x,
        (None, y) => y,
    }
}
