//! Markdown summary report.

use anyhow::{Context, Result};
use std::path::Path;

use crate::runner::PairingRun;
use fillpair_core::domain::Position;

pub struct MarkdownReportGenerator;

impl MarkdownReportGenerator {
    pub fn generate(&self, run: &PairingRun) -> String {
        let summary = &run.summary;
        let mut report = format!(
            "# Fill Pairing Report\n\n\
Run ID: `{}`\n\
Input hash: `{}`\n\n\
## Summary\n\
- Fills: {}\n\
- Positions: {} ({} closed, {} pending)\n\
- Realized PnL: {:+.2}\n\
- Win Rate: {:.1}% ({} won / {} lost)\n\
- Best: {}\n\
- Worst: {}\n\
- Average Return: {}\n",
            run.run_id,
            run.input_hash,
            run.fill_count,
            summary.position_count,
            summary.closed_count,
            summary.pending_count,
            summary.realized_pnl,
            summary.win_rate * 100.0,
            summary.winners,
            summary.losers,
            signed(summary.best_pnl),
            signed(summary.worst_pnl),
            percent(summary.avg_pnl_percent),
        );

        if !run.symbols.is_empty() {
            report.push_str("\n## Symbols\n\n");
            report.push_str("| Symbol | Market | Positions | Closed | Realized PnL | Win Rate | Ignored Fees |\n");
            report.push_str("|--------|--------|-----------|--------|--------------|----------|--------------|\n");
            for r in &run.symbols {
                let market = r
                    .market
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                report.push_str(&format!(
                    "| {} | {} | {} | {} | {:+.2} | {:.1}% | {} |\n",
                    r.symbol,
                    market,
                    r.summary.position_count,
                    r.summary.closed_count,
                    r.summary.realized_pnl,
                    r.summary.win_rate * 100.0,
                    r.ignored_fee_count,
                ));
            }
        }

        let mut closed: Vec<(&str, &Position)> = run
            .positions()
            .filter(|(_, p)| p.is_closed() && p.pnl.is_some())
            .collect();
        if !closed.is_empty() {
            closed.sort_by(|a, b| {
                b.1.pnl
                    .partial_cmp(&a.1.pnl)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            report.push_str("\n## Top Winners\n");
            push_position_header(&mut report);
            for (symbol, p) in closed.iter().filter(|(_, p)| p.is_winner()).take(5) {
                push_position_row(&mut report, symbol, p);
            }

            report.push_str("\n## Top Losers\n");
            push_position_header(&mut report);
            for (symbol, p) in closed
                .iter()
                .rev()
                .filter(|(_, p)| p.pnl.is_some_and(|pnl| pnl < 0.0))
                .take(5)
            {
                push_position_row(&mut report, symbol, p);
            }
        }

        let pending: Vec<(&str, &Position)> = run.positions().filter(|(_, p)| !p.is_closed()).collect();
        if !pending.is_empty() {
            report.push_str("\n## Pending Positions\n\n");
            report.push_str("| Symbol | Dates | Buys | Sells | Open Size | Avg Buy |\n");
            report.push_str("|--------|-------|------|-------|-----------|---------|\n");
            for (symbol, p) in pending {
                report.push_str(&format!(
                    "| {} | {} | {} | {} | {:.6} | {} |\n",
                    symbol,
                    p.date_range,
                    p.buys.len(),
                    p.sells.len(),
                    p.open_size(),
                    price(p.avg_buy_price),
                ));
            }
        }

        report.push_str(
            "\n## Notes\n\
- Fees charged in a third currency are excluded from cost and revenue.\n\
- Positions and the run manifest are exported alongside this report.\n",
        );

        report
    }
}

pub fn write_summary_markdown(path: &Path, run: &PairingRun) -> Result<()> {
    let report = MarkdownReportGenerator.generate(run);
    std::fs::write(path, report)
        .with_context(|| format!("Failed to write summary report {}", path.display()))?;
    Ok(())
}

fn push_position_header(report: &mut String) {
    report.push_str("| Symbol | Dates | Avg Buy | Avg Sell | PnL | Return |\n");
    report.push_str("|--------|-------|---------|----------|-----|--------|\n");
}

fn push_position_row(report: &mut String, symbol: &str, p: &Position) {
    report.push_str(&format!(
        "| {} | {} | {} | {} | {} | {} |\n",
        symbol,
        p.date_range,
        price(p.avg_buy_price),
        price(p.avg_sell_price),
        signed(p.pnl),
        percent(p.pnl_percent),
    ));
}

fn signed(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:+.2}"))
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:+.2}%"))
}

fn price(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}
