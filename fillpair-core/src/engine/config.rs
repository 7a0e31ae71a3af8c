//! Pairing configuration.

use super::calendar::Calendar;
use crate::domain::Market;
use serde::{Deserialize, Serialize};

/// Default net-position tolerance in base units.
///
/// Absorbs size-precision noise from exchange APIs. Assets traded in very small
/// unit sizes need a tighter value.
pub const DEFAULT_TOLERANCE: f64 = 0.001;

/// What to do when fills for more than one symbol reach the pairer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolPolicy {
    /// Pair everything together, whatever the symbol.
    #[default]
    Ignore,
    /// Reject input whose fills do not all share the first fill's symbol.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingConfig {
    /// A position closes once `|net position| < tolerance`.
    pub tolerance: f64,
    /// Offset (minutes east of UTC) used for calendar-day labels.
    pub utc_offset_minutes: i32,
    pub symbol_policy: SymbolPolicy,
    /// Explicit market; derived from the first fill's symbol when absent.
    pub market: Option<Market>,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            utc_offset_minutes: 0,
            symbol_policy: SymbolPolicy::Ignore,
            market: None,
        }
    }
}

impl PairingConfig {
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_market(mut self, market: Market) -> Self {
        self.market = Some(market);
        self
    }

    pub fn with_symbol_policy(mut self, policy: SymbolPolicy) -> Self {
        self.symbol_policy = policy;
        self
    }

    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }

    pub fn calendar(&self) -> Calendar {
        Calendar::with_offset_minutes(self.utc_offset_minutes)
    }

    /// Tolerance actually used by the scan; falls back to the default when the
    /// configured value is not a positive finite number.
    pub fn effective_tolerance(&self) -> f64 {
        if self.tolerance.is_finite() && self.tolerance > 0.0 {
            self.tolerance
        } else {
            DEFAULT_TOLERANCE
        }
    }
}
