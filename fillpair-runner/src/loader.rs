//! Fill loading from JSON or CSV files.
//!
//! JSON input is an array of fill objects (camelCase keys). CSV input has the
//! header `tradeId,orderId,symbol,side,price,size,feeAmount,feeCurrency,timestamp`;
//! `orderId`, `feeAmount` and `feeCurrency` may be omitted.
//!
//! Records that do not deserialize (unknown side, missing trade id, non-numeric
//! timestamp) are skipped with a warning. Malformed numbers inside an otherwise
//! valid record are kept with a warning; the engine reads them as zero.

use fillpair_core::decimal::is_valid_decimal;
use fillpair_core::domain::Fill;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read fills from '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot infer fill format from '{0}' (use .json or .csv, or pass a format)")]
    UnknownFormat(PathBuf),
    #[error("unsupported fill format '{0}' (expected json or csv)")]
    UnsupportedFormat(String),
    #[error("invalid JSON fill document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid CSV fill document: {0}")]
    Csv(#[from] csv::Error),
}

/// On-disk encoding of a fill file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillFormat {
    Json,
    Csv,
}

impl FillFormat {
    /// Format implied by the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

impl FromStr for FillFormat {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(LoadError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for FillFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

/// Load fills from `path`. `format` overrides the extension when given.
pub fn load_fills(path: &Path, format: Option<FillFormat>) -> Result<Vec<Fill>, LoadError> {
    let format = match format.or_else(|| FillFormat::from_path(path)) {
        Some(format) => format,
        None => return Err(LoadError::UnknownFormat(path.to_path_buf())),
    };
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let fills = match format {
        FillFormat::Json => read_fills_json(file)?,
        FillFormat::Csv => read_fills_csv(file)?,
    };
    tracing::info!(path = %path.display(), format = %format, fills = fills.len(), "fills loaded");
    Ok(fills)
}

/// Parse a JSON array of fills, skipping records that do not deserialize.
pub fn read_fills_json<R: Read>(reader: R) -> Result<Vec<Fill>, LoadError> {
    let records: Vec<serde_json::Value> = serde_json::from_reader(reader)?;
    let mut fills = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        match serde_json::from_value::<Fill>(record) {
            Ok(fill) => {
                warn_malformed_numbers(&fill);
                fills.push(fill);
            }
            Err(err) => tracing::warn!(index, error = %err, "skipping unparsable fill record"),
        }
    }
    Ok(fills)
}

/// Parse CSV fills (with header), skipping rows that do not deserialize.
pub fn read_fills_csv<R: Read>(reader: R) -> Result<Vec<Fill>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    // Header errors abort; row errors only skip the row.
    rdr.headers()?;

    let mut fills = Vec::new();
    for (index, row) in rdr.deserialize::<Fill>().enumerate() {
        match row {
            Ok(fill) => {
                warn_malformed_numbers(&fill);
                fills.push(fill);
            }
            Err(err) => tracing::warn!(row = index + 1, error = %err, "skipping unparsable CSV row"),
        }
    }
    Ok(fills)
}

/// Numeric fields of `fill` that will be read as zero. An empty fee means no fee.
pub fn malformed_fields(fill: &Fill) -> Vec<&'static str> {
    let mut fields = Vec::new();
    if !is_valid_decimal(&fill.price) {
        fields.push("price");
    }
    if !is_valid_decimal(&fill.size) {
        fields.push("size");
    }
    if !fill.fee_amount.trim().is_empty() && !is_valid_decimal(&fill.fee_amount) {
        fields.push("feeAmount");
    }
    fields
}

fn warn_malformed_numbers(fill: &Fill) {
    let fields = malformed_fields(fill);
    if !fields.is_empty() {
        tracing::warn!(
            trade_id = %fill.trade_id,
            fields = ?fields,
            "malformed numbers in fill, reading them as zero"
        );
    }
}

/// Group fills by symbol, keeping input order inside each group.
pub fn partition_by_symbol(fills: Vec<Fill>) -> BTreeMap<String, Vec<Fill>> {
    let mut groups: BTreeMap<String, Vec<Fill>> = BTreeMap::new();
    for fill in fills {
        groups.entry(fill.symbol.clone()).or_default().push(fill);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use fillpair_core::domain::Side;

    const CSV: &str = "\
tradeId,orderId,symbol,side,price,size,feeAmount,feeCurrency,timestamp
1,o-1,BTC-USDT,buy,40000,1,50,USDT,1709544600000
2,o-2,BTC-USDT,sell,41000.5,1,50,USDT,1709548200000
";

    #[test]
    fn format_from_extension() {
        assert_eq!(FillFormat::from_path(Path::new("a/b.json")), Some(FillFormat::Json));
        assert_eq!(FillFormat::from_path(Path::new("fills.CSV")), Some(FillFormat::Csv));
        assert_eq!(FillFormat::from_path(Path::new("fills.txt")), None);
        assert_eq!(FillFormat::from_path(Path::new("fills")), None);
    }

    #[test]
    fn format_from_str() {
        assert_eq!("JSON".parse::<FillFormat>().unwrap(), FillFormat::Json);
        assert!(matches!(
            "parquet".parse::<FillFormat>(),
            Err(LoadError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn reads_csv_rows() {
        let fills = read_fills_csv(CSV.as_bytes()).unwrap();
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].trade_id.as_str(), "1");
        assert_eq!(fills[0].side, Side::Buy);
        assert_eq!(fills[0].price_value(), 40000.0);
        assert_eq!(fills[1].price_value(), 41000.5);
        assert_eq!(fills[1].fee_currency, "USDT");
        assert_eq!(fills[1].timestamp, 1_709_548_200_000);
    }

    #[test]
    fn csv_optional_columns_default() {
        let csv = "tradeId,symbol,side,price,size,timestamp\n7,ETH-USDT,SELL,3000,2,1\n";
        let fills = read_fills_csv(csv.as_bytes()).unwrap();
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].side, Side::Sell);
        assert_eq!(fills[0].fee_amount, "");
        assert_eq!(fills[0].order_id.0, "");
    }

    #[test]
    fn csv_skips_bad_rows() {
        let csv = "\
tradeId,symbol,side,price,size,timestamp
1,BTC-USDT,buy,1,1,10
2,BTC-USDT,hold,1,1,11
3,BTC-USDT,sell,1,1,yesterday
4,BTC-USDT,sell,1,1,12
";
        let fills = read_fills_csv(csv.as_bytes()).unwrap();
        let ids: Vec<&str> = fills.iter().map(|f| f.trade_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "4"]);
    }

    #[test]
    fn reads_json_with_mixed_number_shapes() {
        let json = r#"[
            {"tradeId":"a","symbol":"BTC-USDT","side":"buy","price":40000,"size":"0.5","timestamp":"1709544600000"},
            {"tradeId":"b","symbol":"BTC-USDT","side":"sell","price":"41000","size":0.5,"timestamp":1709548200000}
        ]"#;
        let fills = read_fills_json(json.as_bytes()).unwrap();
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].price, "40000");
        assert_eq!(fills[0].timestamp, 1_709_544_600_000);
        assert_eq!(fills[1].size_value(), 0.5);
    }

    #[test]
    fn json_skips_bad_records_but_rejects_non_arrays() {
        let json = r#"[
            {"tradeId":"a","symbol":"X-Y","side":"buy","price":"1","size":"1","timestamp":1},
            {"symbol":"X-Y","side":"buy","price":"1","size":"1","timestamp":2}
        ]"#;
        assert_eq!(read_fills_json(json.as_bytes()).unwrap().len(), 1);
        assert!(matches!(
            read_fills_json(r#"{"fills":[]}"#.as_bytes()),
            Err(LoadError::Json(_))
        ));
    }

    #[test]
    fn malformed_numbers_are_kept_and_flagged() {
        let csv = "\
tradeId,symbol,side,price,size,feeAmount,feeCurrency,timestamp
1,BTC-USDT,buy,40000,1,,,10
2,BTC-USDT,sell,n/a,1,0.5,USDT,11
3,BTC-USDT,sell,41000,,abc,USDT,12
";
        let fills = read_fills_csv(csv.as_bytes()).unwrap();
        assert_eq!(fills.len(), 3);
        assert!(malformed_fields(&fills[0]).is_empty());
        assert_eq!(malformed_fields(&fills[1]), vec!["price"]);
        assert_eq!(fills[1].price_value(), 0.0);
        assert_eq!(malformed_fields(&fills[2]), vec!["size", "feeAmount"]);
    }

    #[test]
    fn partition_keeps_input_order_per_symbol() {
        let fills = read_fills_json(
            r#"[
            {"tradeId":"3","symbol":"ETH-USDT","side":"buy","price":"1","size":"1","timestamp":3},
            {"tradeId":"1","symbol":"BTC-USDT","side":"buy","price":"1","size":"1","timestamp":1},
            {"tradeId":"2","symbol":"ETH-USDT","side":"sell","price":"1","size":"1","timestamp":2}
        ]"#
            .as_bytes(),
        )
        .unwrap();
        let groups = partition_by_symbol(fills);
        let symbols: Vec<&String> = groups.keys().collect();
        assert_eq!(symbols, vec!["BTC-USDT", "ETH-USDT"]);
        let eth: Vec<&str> = groups["ETH-USDT"].iter().map(|f| f.trade_id.as_str()).collect();
        assert_eq!(eth, vec!["3", "2"]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_fills(Path::new("/no/such/fills.json"), None).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        let err = load_fills(Path::new("/no/such/fills"), None).unwrap_err();
        assert!(matches!(err, LoadError::UnknownFormat(_)));
    }
}
