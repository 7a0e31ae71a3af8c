//! Plain-text tables for terminal output.

use fillpair_core::domain::{Fill, Position};
use fillpair_core::engine::Calendar;

const HEADERS: [&str; 9] = [
    "Dates", "Status", "Buys", "Sells", "Avg Buy", "Avg Sell", "Size", "PnL", "PnL %",
];

/// One line per position, most recent first, with aligned columns.
pub fn render_table(positions: &[Position]) -> String {
    let rows: Vec<[String; 9]> = positions
        .iter()
        .map(|p| {
            [
                p.date_range.clone(),
                p.status.to_string(),
                p.buys.len().to_string(),
                p.sells.len().to_string(),
                opt(p.avg_buy_price, |v| format!("{v:.2}")),
                opt(p.avg_sell_price, |v| format!("{v:.2}")),
                format!("{:.6}", p.total_buy_size.max(p.total_sell_size)),
                opt(p.pnl, |v| format!("{v:+.2}")),
                opt(p.pnl_percent, |v| format!("{v:+.2}%")),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &HEADERS.map(String::from), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("  "));
    out.push('\n');
    for row in &rows {
        push_line(&mut out, row, &widths);
    }
    out
}

/// Legs of one position in chronological order. The opening leg, buy or sell,
/// sets the reference day; legs on any other calendar day carry their day of
/// month, e.g. `[d6]`.
pub fn render_legs(position: &Position, calendar: &Calendar) -> String {
    let legs = position.fills();
    let opening = legs.first().map_or(&[][..], |first| std::slice::from_ref(*first));
    let mut out = String::new();
    for fill in legs.iter().copied() {
        let moved = if calendar.is_moved_order(fill, opening) {
            format!(" [d{}]", calendar.day_of_month(fill))
        } else {
            String::new()
        };
        out.push_str(&format!("  {}{}\n", describe(fill), moved));
    }
    out
}

fn describe(fill: &Fill) -> String {
    let fee = if fill.fee_value() > 0.0 {
        format!(" fee {} {}", fill.fee_amount, fill.fee_currency)
    } else {
        String::new()
    };
    format!(
        "{:<4} {} @ {} ({}){}",
        fill.side.to_string(),
        fill.size,
        fill.price,
        fill.trade_id,
        fee
    )
}

fn push_line(out: &mut String, cells: &[String; 9], widths: &[usize; 9]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths.iter())
        .enumerate()
        .map(|(i, (cell, width))| {
            // Dates and status left-aligned, numbers right-aligned.
            if i < 2 {
                format!("{cell:<width$}")
            } else {
                format!("{cell:>width$}")
            }
        })
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

fn opt(value: Option<f64>, f: impl Fn(f64) -> String) -> String {
    value.map_or_else(|| "-".to_string(), f)
}
