//! Position metrics: fee-adjusted cost basis, revenue and realized PnL.
//!
//! Pure functions: legs in, `Position` out.

use super::calendar::Calendar;
use crate::domain::{FeeAsset, Fill, Market, Position, PositionStatus};

/// Market context needed to price a position's fees and label its dates.
#[derive(Debug, Clone, Copy)]
pub struct MetricsContext<'a> {
    pub market: Option<&'a Market>,
    pub calendar: Calendar,
}

impl<'a> MetricsContext<'a> {
    pub fn new(market: Option<&'a Market>, calendar: Calendar) -> Self {
        Self { market, calendar }
    }

    fn fee_asset(&self, fill: &Fill) -> FeeAsset {
        match self.market {
            Some(market) => market.classify_fee(&fill.fee_currency),
            None => FeeAsset::Other,
        }
    }
}

/// Buy-side aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BuyTotals {
    /// Base units actually received (base-asset fees deducted).
    pub size: f64,
    /// Gross notional plus quote-currency fees.
    pub cost: f64,
}

/// Sell-side aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SellTotals {
    /// Gross base units sold.
    pub size: f64,
    /// Notional net of fees, fees in base asset converted at the fill price.
    pub revenue: f64,
}

pub fn aggregate_buys(buys: &[Fill], ctx: &MetricsContext<'_>) -> BuyTotals {
    buys.iter().fold(BuyTotals::default(), |mut acc, fill| {
        let size = fill.size_value();
        let fee = fill.fee_value();
        match ctx.fee_asset(fill) {
            FeeAsset::Base => {
                acc.size += size - fee;
                acc.cost += fill.notional();
            }
            FeeAsset::Quote => {
                acc.size += size;
                acc.cost += fill.notional() + fee;
            }
            FeeAsset::Other => {
                acc.size += size;
                acc.cost += fill.notional();
            }
        }
        acc
    })
}

pub fn aggregate_sells(sells: &[Fill], ctx: &MetricsContext<'_>) -> SellTotals {
    sells.iter().fold(SellTotals::default(), |mut acc, fill| {
        let fee = fill.fee_value();
        acc.size += fill.size_value();
        acc.revenue += fill.notional();
        match ctx.fee_asset(fill) {
            FeeAsset::Quote => acc.revenue -= fee,
            FeeAsset::Base => acc.revenue -= fee * fill.price_value(),
            FeeAsset::Other => {}
        }
        acc
    })
}

/// `total / size` when size is positive.
fn average(total: f64, size: f64) -> Option<f64> {
    (size > 0.0).then(|| total / size)
}

/// Realized PnL on the matched size: `(pnl, pnl_percent)`.
///
/// Both are `None` unless both legs have positive size and an average buy
/// price exists. `pnl_percent` is also `None` when the cost basis is zero.
pub fn realized_pnl(
    buys: BuyTotals,
    sells: SellTotals,
    avg_buy_price: Option<f64>,
) -> (Option<f64>, Option<f64>) {
    let Some(avg_buy) = avg_buy_price else {
        return (None, None);
    };
    if buys.size <= 0.0 || sells.size <= 0.0 {
        return (None, None);
    }
    let matched = buys.size.min(sells.size);
    let cost_basis = matched * avg_buy;
    let pnl = sells.revenue - cost_basis;
    let pnl_percent = (cost_basis != 0.0).then(|| pnl / cost_basis * 100.0);
    (Some(pnl), pnl_percent)
}

/// Build a position from its legs, computing every aggregate.
pub fn compute_position(
    buys: Vec<Fill>,
    sells: Vec<Fill>,
    status: PositionStatus,
    ctx: &MetricsContext<'_>,
) -> Position {
    let buy_totals = aggregate_buys(&buys, ctx);
    let sell_totals = aggregate_sells(&sells, ctx);
    let avg_buy_price = average(buy_totals.cost, buy_totals.size);
    let avg_sell_price = average(sell_totals.revenue, sell_totals.size);
    let (pnl, pnl_percent) = realized_pnl(buy_totals, sell_totals, avg_buy_price);

    let timestamps = || buys.iter().chain(sells.iter()).map(|f| f.timestamp);
    let opened_at = timestamps().min().unwrap_or_default();
    let closed_at = timestamps().max().unwrap_or_default();
    let date_range = ctx.calendar.date_range(timestamps());

    Position {
        date_range,
        status,
        opened_at,
        closed_at,
        buys,
        sells,
        total_buy_size: buy_totals.size,
        total_buy_cost: buy_totals.cost,
        avg_buy_price,
        total_sell_size: sell_totals.size,
        total_sell_revenue: sell_totals.revenue,
        avg_sell_price,
        pnl,
        pnl_percent,
    }
}
