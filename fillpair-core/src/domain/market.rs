//! Market metadata: which asset is the base and which is the quote currency.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Quote currencies recognised when splitting a concatenated symbol like `BTCUSDT`.
/// Longest first so `USDT` wins over `USD`.
const KNOWN_QUOTES: &[&str] = &[
    "FDUSD", "USDT", "USDC", "BUSD", "TUSD", "USD", "EUR", "GBP", "TRY", "BRL", "BTC", "ETH",
    "BNB", "DAI",
];

#[derive(Debug, Error, PartialEq)]
pub enum MarketError {
    #[error("cannot derive base/quote from symbol '{0}'")]
    UnknownSymbol(String),
    #[error("base and quote must differ (got '{0}')")]
    SameAsset(String),
    #[error("asset code must not be empty")]
    EmptyAsset,
}

/// Which side of the market a fee was charged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeAsset {
    /// Fee deducted from the base asset (reduces the quantity received).
    Base,
    /// Fee charged in the quote currency.
    Quote,
    /// Fee paid in a third currency, e.g. an exchange token. Not convertible here.
    Other,
}

/// Base/quote pair for one traded symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub base: String,
    pub quote: String,
}

impl Market {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Result<Self, MarketError> {
        let base = base.into().trim().to_uppercase();
        let quote = quote.into().trim().to_uppercase();
        if base.is_empty() || quote.is_empty() {
            return Err(MarketError::EmptyAsset);
        }
        if base == quote {
            return Err(MarketError::SameAsset(base));
        }
        Ok(Self { base, quote })
    }

    /// Split a symbol into base and quote.
    ///
    /// Accepts `BTC-USDT`, `BTC/USDT`, `BTC_USDT` and concatenated `BTCUSDT`
    /// (the latter only when it ends in a known quote currency).
    pub fn parse(symbol: &str) -> Result<Self, MarketError> {
        let upper = symbol.trim().to_uppercase();
        if let Some((base, quote)) = upper.split_once(['-', '/', '_']) {
            return Self::new(base, quote)
                .map_err(|_| MarketError::UnknownSymbol(symbol.to_string()));
        }
        KNOWN_QUOTES
            .iter()
            .find_map(|quote| {
                upper
                    .strip_suffix(quote)
                    .filter(|base| !base.is_empty())
                    .and_then(|base| Self::new(base, *quote).ok())
            })
            .ok_or_else(|| MarketError::UnknownSymbol(symbol.to_string()))
    }

    /// Classify a fee currency against this market (case-insensitive).
    pub fn classify_fee(&self, fee_currency: &str) -> FeeAsset {
        let currency = fee_currency.trim();
        if currency.eq_ignore_ascii_case(&self.base) {
            FeeAsset::Base
        } else if currency.eq_ignore_ascii_case(&self.quote) {
            FeeAsset::Quote
        } else {
            FeeAsset::Other
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.base, self.quote)
    }
}
