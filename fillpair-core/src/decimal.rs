//! Lenient decimal handling for exchange-supplied numeric strings.
//!
//! Exchange APIs hand out prices, sizes and fees as decimal strings. The engine
//! does its arithmetic in `f64`; anything that does not parse to a finite number
//! is treated as zero so that a single malformed record can never abort a run.

/// Parse a decimal string, coercing empty, malformed or non-finite input to `0.0`.
pub fn parse_decimal(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Returns true when `raw` parses to a finite number.
pub fn is_valid_decimal(raw: &str) -> bool {
    matches!(raw.trim().parse::<f64>(), Ok(v) if v.is_finite())
}

/// Serde helpers for the wire shapes exchanges actually send.
pub mod serde_util {
    use serde::de::{self, Visitor};
    use serde::Deserializer;
    use std::fmt;

    /// Deserialize a decimal that may arrive as a JSON string or a JSON number,
    /// keeping its textual form.
    pub mod decimal_string {
        use super::*;

        pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_any(DecimalStringVisitor)
        }

        struct DecimalStringVisitor;

        impl<'de> Visitor<'de> for DecimalStringVisitor {
            type Value = String;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a decimal string or number")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
                Ok(v.to_string())
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
                Ok(v)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
                Ok(v.to_string())
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
                Ok(v.to_string())
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
                Ok(v.to_string())
            }

            fn visit_unit<E: de::Error>(self) -> Result<String, E> {
                Ok(String::new())
            }

            fn visit_none<E: de::Error>(self) -> Result<String, E> {
                Ok(String::new())
            }
        }
    }

    /// Deserialize epoch milliseconds from a JSON number or a numeric string.
    pub mod timestamp_ms {
        use super::*;

        pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_any(TimestampVisitor)
        }

        struct TimestampVisitor;

        impl<'de> Visitor<'de> for TimestampVisitor {
            type Value = i64;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("epoch milliseconds as a number or numeric string")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
                Ok(v)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
                i64::try_from(v).map_err(|_| E::custom(format!("timestamp out of range: {v}")))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
                if v.is_finite() {
                    Ok(v.trunc() as i64)
                } else {
                    Err(E::custom("timestamp is not finite"))
                }
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
                let trimmed = v.trim();
                if let Ok(ms) = trimmed.parse::<i64>() {
                    return Ok(ms);
                }
                match trimmed.parse::<f64>() {
                    Ok(ms) if ms.is_finite() => Ok(ms.trunc() as i64),
                    _ => Err(E::custom(format!("invalid timestamp: {v:?}"))),
                }
            }
        }
    }
}
