//! Pairing runner: wires together config, partitioning, engine and summaries.
//!
//! `run_pairing()` is the single entry point used by the CLI. Symbols are
//! independent, so each partition is paired on the rayon pool; reports come
//! back sorted by symbol so the output does not depend on scheduling.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use fillpair_core::domain::{FeeAsset, Fill, Market, Position};
use fillpair_core::engine::pairing::{resolve_market, sort_chronologically};
use fillpair_core::engine::{try_pair_trades, PairingConfig, PairingError, SymbolPolicy};
use fillpair_core::summary::PairingSummary;

use crate::config::{ConfigError, RunConfig};
use crate::loader::partition_by_symbol;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("pairing error: {0}")]
    Pairing(#[from] PairingError),
    #[error("symbol '{0}' not found in input fills")]
    SymbolNotFound(String),
    #[error("failed to fingerprint run: {0}")]
    Fingerprint(#[from] serde_json::Error),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Label used for the single report of an ungrouped run over several symbols.
pub const MIXED_SYMBOLS: &str = "*";

/// Positions and statistics for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolReport {
    pub symbol: String,
    /// Market used for fee classification; `None` means every fee was ignored.
    pub market: Option<Market>,
    /// Most recent first.
    pub positions: Vec<Position>,
    pub summary: PairingSummary,
    /// Fills whose fee was charged in neither the base nor the quote asset.
    pub ignored_fee_count: usize,
}

/// Complete result of a pairing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingRun {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Content address of (config, fill set); names the artifact directory.
    pub run_id: String,
    /// BLAKE3 over the canonically ordered fill set.
    pub input_hash: String,
    pub fill_count: usize,
    pub symbols: Vec<SymbolReport>,
    pub summary: PairingSummary,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl PairingRun {
    pub fn symbol(&self, symbol: &str) -> Option<&SymbolReport> {
        self.symbols.iter().find(|r| r.symbol == symbol)
    }

    /// Every position of the run, symbol by symbol.
    pub fn positions(&self) -> impl Iterator<Item = (&str, &Position)> {
        self.symbols
            .iter()
            .flat_map(|r| r.positions.iter().map(move |p| (r.symbol.as_str(), p)))
    }
}

/// Pair `fills` according to `config`.
///
/// With `symbol_filter`, only fills of that symbol (case-insensitive) are
/// considered; a filter that matches nothing is an error. Fills are grouped per
/// symbol unless `pairing.group_by_symbol` is false, in which case one scan runs
/// over everything and the symbol policy decides whether mixed input is allowed.
pub fn run_pairing(
    fills: Vec<Fill>,
    config: &RunConfig,
    symbol_filter: Option<&str>,
) -> Result<PairingRun, RunError> {
    config.validate()?;
    let pairing = config.pairing_config()?;

    let fills = match symbol_filter {
        Some(wanted) => {
            let kept: Vec<Fill> = fills
                .into_iter()
                .filter(|f| f.symbol.eq_ignore_ascii_case(wanted))
                .collect();
            if kept.is_empty() {
                return Err(RunError::SymbolNotFound(wanted.to_string()));
            }
            kept
        }
        None => fills,
    };

    let input_hash = fill_set_hash(&fills)?;
    let run_id = run_id(config, &input_hash)?;
    let fill_count = fills.len();

    let groups: Vec<(String, Vec<Fill>)> = if config.pairing.group_by_symbol {
        partition_by_symbol(fills).into_iter().collect()
    } else {
        ungrouped(fills, &pairing)
    };

    tracing::info!(
        run_id = %run_id,
        fills = fill_count,
        groups = groups.len(),
        "pairing run started"
    );

    let mut symbols = groups
        .into_par_iter()
        .map(|(symbol, fills)| pair_symbol(symbol, &fills, &pairing))
        .collect::<Result<Vec<_>, _>>()?;
    symbols.sort_by(|a, b| a.symbol.cmp(&b.symbol));

    let summary = PairingSummary::combine(symbols.iter().map(|r| &r.summary));
    tracing::info!(
        run_id = %run_id,
        positions = summary.position_count,
        closed = summary.closed_count,
        realized_pnl = summary.realized_pnl,
        "pairing run finished"
    );

    Ok(PairingRun {
        schema_version: SCHEMA_VERSION,
        run_id,
        input_hash,
        fill_count,
        symbols,
        summary,
    })
}

/// One group holding every fill, labelled by its symbol when there is only one.
fn ungrouped(fills: Vec<Fill>, pairing: &PairingConfig) -> Vec<(String, Vec<Fill>)> {
    let Some(first) = fills.first() else {
        return Vec::new();
    };
    let mixed = fills.iter().any(|f| f.symbol != first.symbol);
    let label = if mixed {
        if pairing.symbol_policy == SymbolPolicy::Ignore {
            tracing::warn!("fills span several symbols; pairing them as one stream");
        }
        MIXED_SYMBOLS.to_string()
    } else {
        first.symbol.clone()
    };
    vec![(label, fills)]
}

fn pair_symbol(
    symbol: String,
    fills: &[Fill],
    pairing: &PairingConfig,
) -> Result<SymbolReport, PairingError> {
    let positions = try_pair_trades(fills, pairing)?;
    let market = resolve_market(&sort_chronologically(fills), pairing);

    let charged = fills.iter().filter(|f| f.fee_value() > 0.0);
    let ignored_fee_count = match &market {
        Some(market) => charged
            .filter(|f| market.classify_fee(&f.fee_currency) == FeeAsset::Other)
            .count(),
        None => {
            let count = charged.count();
            if count > 0 {
                tracing::warn!(symbol = %symbol, fees = count, "cannot derive market; fees ignored");
            }
            count
        }
    };
    if ignored_fee_count > 0 {
        tracing::debug!(symbol = %symbol, fills = ignored_fee_count, "third-currency fees ignored");
    }

    for position in positions.iter().filter(|p| p.is_closed()) {
        tracing::debug!(
            symbol = %symbol,
            date_range = %position.date_range,
            fills = position.fill_count(),
            pnl = ?position.pnl,
            "position closed"
        );
    }

    let summary = PairingSummary::compute(&positions);
    tracing::info!(
        symbol = %symbol,
        fills = fills.len(),
        positions = positions.len(),
        pending = summary.pending_count,
        "symbol paired"
    );

    Ok(SymbolReport {
        symbol,
        market,
        positions,
        summary,
        ignored_fee_count,
    })
}

/// BLAKE3 over the fill set in (symbol, timestamp, trade id) order.
pub fn fill_set_hash(fills: &[Fill]) -> Result<String, serde_json::Error> {
    let mut ordered: Vec<&Fill> = fills.iter().collect();
    ordered.sort_by(|a, b| {
        a.symbol
            .cmp(&b.symbol)
            .then(a.timestamp.cmp(&b.timestamp))
            .then_with(|| a.trade_id.cmp(&b.trade_id))
    });
    let mut hasher = blake3::Hasher::new();
    for fill in ordered {
        hasher.update(&serde_json::to_vec(fill)?);
        hasher.update(b"\n");
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Short content address of a run: config plus fill-set hash.
fn run_id(config: &RunConfig, input_hash: &str) -> Result<String, serde_json::Error> {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&serde_json::to_vec(&config.pairing)?);
    hasher.update(&serde_json::to_vec(&config.market)?);
    hasher.update(input_hash.as_bytes());
    let hex = hasher.finalize().to_hex();
    Ok(hex.as_str()[..16].to_string())
}
