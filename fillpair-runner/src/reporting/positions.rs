//! Position export (CSV/JSON).

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use crate::runner::PairingRun;
use fillpair_core::domain::Position;

/// Flat CSV row for one position.
#[derive(Debug, Serialize)]
struct PositionRow<'a> {
    symbol: &'a str,
    date_range: &'a str,
    status: String,
    opened_at: i64,
    closed_at: i64,
    buy_count: usize,
    sell_count: usize,
    total_buy_size: f64,
    total_buy_cost: f64,
    avg_buy_price: Option<f64>,
    total_sell_size: f64,
    total_sell_revenue: f64,
    avg_sell_price: Option<f64>,
    pnl: Option<f64>,
    pnl_percent: Option<f64>,
}

impl<'a> PositionRow<'a> {
    fn new(symbol: &'a str, p: &'a Position) -> Self {
        Self {
            symbol,
            date_range: &p.date_range,
            status: p.status.to_string(),
            opened_at: p.opened_at,
            closed_at: p.closed_at,
            buy_count: p.buys.len(),
            sell_count: p.sells.len(),
            total_buy_size: p.total_buy_size,
            total_buy_cost: p.total_buy_cost,
            avg_buy_price: p.avg_buy_price,
            total_sell_size: p.total_sell_size,
            total_sell_revenue: p.total_sell_revenue,
            avg_sell_price: p.avg_sell_price,
            pnl: p.pnl,
            pnl_percent: p.pnl_percent,
        }
    }
}

/// One row per position, symbols in run order, most recent position first.
/// Missing metrics are written as empty cells.
pub fn write_positions_csv(path: &Path, run: &PairingRun) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create positions CSV {}", path.display()))?;
    for (symbol, position) in run.positions() {
        writer
            .serialize(PositionRow::new(symbol, position))
            .with_context(|| format!("Failed to write position row to {}", path.display()))?;
    }
    // An empty run still gets a header row.
    if run.summary.position_count == 0 {
        writer.write_record([
            "symbol",
            "date_range",
            "status",
            "opened_at",
            "closed_at",
            "buy_count",
            "sell_count",
            "total_buy_size",
            "total_buy_cost",
            "avg_buy_price",
            "total_sell_size",
            "total_sell_revenue",
            "avg_sell_price",
            "pnl",
            "pnl_percent",
        ])?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush positions CSV {}", path.display()))?;
    Ok(())
}

/// The whole run (schema version, per-symbol positions and summaries) as JSON.
pub fn write_positions_json(path: &Path, run: &PairingRun) -> Result<()> {
    let json = serde_json::to_string_pretty(run).context("Failed to serialize positions")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write positions JSON {}", path.display()))?;
    Ok(())
}
