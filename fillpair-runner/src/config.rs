//! TOML run configuration.
//!
//! Every section is optional; a missing file section falls back to defaults.
//!
//! ```toml
//! [pairing]
//! tolerance = 0.001
//! utc_offset_minutes = 0
//! symbol_policy = "ignore"
//! group_by_symbol = true
//!
//! [market]
//! base = "BTC"
//! quote = "USDT"
//!
//! [report]
//! output_dir = "reports"
//! formats = ["json", "csv", "markdown"]
//! ```

use fillpair_core::domain::{Market, MarketError};
use fillpair_core::engine::{PairingConfig, SymbolPolicy, DEFAULT_TOLERANCE};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Largest accepted calendar offset, exclusive (24h in minutes).
const MAX_OFFSET_MINUTES: i32 = 24 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("tolerance must be a positive finite number (got {0})")]
    InvalidTolerance(f64),
    #[error("utc_offset_minutes must be strictly between -1440 and 1440 (got {0})")]
    InvalidUtcOffset(i32),
    #[error("invalid market: {0}")]
    Market(#[from] MarketError),
    #[error("unknown report format '{0}' (expected json, csv or markdown)")]
    UnknownReportFormat(String),
}

/// Top-level run configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub pairing: PairingSection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market: Option<MarketSection>,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingSection {
    pub tolerance: f64,
    pub utc_offset_minutes: i32,
    pub symbol_policy: SymbolPolicy,
    /// Pair each symbol on its own. When false, every fill goes through one scan.
    pub group_by_symbol: bool,
}

impl Default for PairingSection {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            utc_offset_minutes: 0,
            symbol_policy: SymbolPolicy::Ignore,
            group_by_symbol: true,
        }
    }
}

/// Explicit base/quote override, applied to every symbol in the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSection {
    pub base: String,
    pub quote: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
    pub formats: Vec<ReportFormat>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("reports"),
            formats: vec![ReportFormat::Json, ReportFormat::Csv, ReportFormat::Markdown],
        }
    }
}

impl ReportConfig {
    pub fn wants(&self, format: ReportFormat) -> bool {
        self.formats.contains(&format)
    }
}

/// Artifact kinds the runner can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Json,
    Csv,
    Markdown,
}

impl FromStr for ReportFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "markdown" | "md" => Ok(Self::Markdown),
            other => Err(ConfigError::UnknownReportFormat(other.to_string())),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
            Self::Markdown => write!(f, "markdown"),
        }
    }
}

impl RunConfig {
    /// Read and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let tolerance = self.pairing.tolerance;
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(ConfigError::InvalidTolerance(tolerance));
        }
        if self.pairing.utc_offset_minutes.abs() >= MAX_OFFSET_MINUTES {
            return Err(ConfigError::InvalidUtcOffset(self.pairing.utc_offset_minutes));
        }
        self.market()?;
        Ok(())
    }

    /// The configured market, if any, normalised.
    pub fn market(&self) -> Result<Option<Market>, ConfigError> {
        self.market
            .as_ref()
            .map(|m| Market::new(&m.base, &m.quote))
            .transpose()
            .map_err(ConfigError::from)
    }

    /// Engine configuration derived from the `[pairing]` and `[market]` sections.
    pub fn pairing_config(&self) -> Result<PairingConfig, ConfigError> {
        let mut config = PairingConfig::default()
            .with_tolerance(self.pairing.tolerance)
            .with_utc_offset_minutes(self.pairing.utc_offset_minutes)
            .with_symbol_policy(self.pairing.symbol_policy);
        if let Some(market) = self.market()? {
            config = config.with_market(market);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = RunConfig::from_toml_str("").unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.pairing.tolerance, DEFAULT_TOLERANCE);
        assert!(config.pairing.group_by_symbol);
        assert_eq!(config.report.formats.len(), 3);
    }

    #[test]
    fn parses_every_section() {
        let config = RunConfig::from_toml_str(
            r#"
            [pairing]
            tolerance = 0.0001
            utc_offset_minutes = -300
            symbol_policy = "strict"
            group_by_symbol = false

            [market]
            base = "eth"
            quote = "usdc"

            [report]
            output_dir = "out"
            formats = ["csv"]
            "#,
        )
        .unwrap();

        assert_eq!(config.pairing.tolerance, 0.0001);
        assert_eq!(config.pairing.utc_offset_minutes, -300);
        assert_eq!(config.pairing.symbol_policy, SymbolPolicy::Strict);
        assert!(!config.pairing.group_by_symbol);
        assert_eq!(config.report.output_dir, PathBuf::from("out"));
        assert!(config.report.wants(ReportFormat::Csv));
        assert!(!config.report.wants(ReportFormat::Json));

        let pairing = config.pairing_config().unwrap();
        assert_eq!(pairing.market, Some(Market::new("ETH", "USDC").unwrap()));
        assert_eq!(pairing.symbol_policy, SymbolPolicy::Strict);
    }

    #[test]
    fn rejects_bad_tolerance() {
        let err = RunConfig::from_toml_str("[pairing]\ntolerance = 0.0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTolerance(_)));
        let err = RunConfig::from_toml_str("[pairing]\ntolerance = -1.0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTolerance(_)));
    }

    #[test]
    fn rejects_offset_of_a_full_day() {
        let err = RunConfig::from_toml_str("[pairing]\nutc_offset_minutes = 1440").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUtcOffset(1440)));
        assert!(RunConfig::from_toml_str("[pairing]\nutc_offset_minutes = 1439").is_ok());
    }

    #[test]
    fn rejects_same_base_and_quote() {
        let err =
            RunConfig::from_toml_str("[market]\nbase = \"usdt\"\nquote = \"USDT\"").unwrap_err();
        assert!(matches!(err, ConfigError::Market(MarketError::SameAsset(_))));
    }

    #[test]
    fn rejects_unknown_symbol_policy() {
        assert!(matches!(
            RunConfig::from_toml_str("[pairing]\nsymbol_policy = \"loose\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn toml_round_trip() {
        let mut config = RunConfig::default();
        config.market = Some(MarketSection {
            base: "BTC".into(),
            quote: "USDT".into(),
        });
        let text = config.to_toml_string().unwrap();
        assert_eq!(RunConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn report_format_from_str() {
        assert_eq!("JSON".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert_eq!("md".parse::<ReportFormat>().unwrap(), ReportFormat::Markdown);
        assert!("xlsx".parse::<ReportFormat>().is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = RunConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
