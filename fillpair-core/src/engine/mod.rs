//! Pairing engine: chronological scan, position metrics, calendar labels.

pub mod calendar;
pub mod config;
pub mod metrics;
pub mod pairing;

pub use calendar::{day_of_month, is_moved_order, Calendar};
pub use config::{PairingConfig, SymbolPolicy, DEFAULT_TOLERANCE};
pub use metrics::{compute_position, MetricsContext};
pub use pairing::{check_single_symbol, pair_trades, try_pair_trades, PairingError};
