//! Universe file loader.
//!
//! Reads a JSON array of records using the dashboard export column names
//! (`TICKER`, `NAME`, `SECTOR`, `INDUSTRY`, `P_NN`, `CLOSE`, `VOLUME`) or
//! their lower-case aliases, and applies the usual data-quality defaults:
//! records without a ticker are dropped, missing categoricals become
//! `"Unknown"`, missing or unusable numbers become `0`.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::security::Security;

/// Label used for a missing sector, industry or name.
pub const UNKNOWN_LABEL: &str = "Unknown";

const TICKER_KEYS: &[&str] = &["TICKER", "ticker", "symbol"];
const NAME_KEYS: &[&str] = &["NAME", "name"];
const SECTOR_KEYS: &[&str] = &["SECTOR", "sector"];
const INDUSTRY_KEYS: &[&str] = &["INDUSTRY", "industry"];
const SIGNAL_KEYS: &[&str] = &["P_NN", "signal"];
const PRICE_KEYS: &[&str] = &["CLOSE", "price", "close"];
const VOLUME_KEYS: &[&str] = &["VOLUME", "volume"];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read universe file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Universe is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Universe must be a JSON array of records, found {0}")]
    Shape(&'static str),
}

impl From<LoadError> for squeeze_common::Error {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::Io { path, source } => {
                squeeze_common::Error::Io(source).with_context(format!("Reading universe {}", path))
            }
            LoadError::Json(e) => squeeze_common::Error::Json(e),
            LoadError::Shape(_) => squeeze_common::Error::InvalidInput(err.to_string()),
        }
    }
}

/// What the loader had to fix or discard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadReport {
    pub loaded: usize,
    /// Records without a usable ticker, or repeating one already loaded
    pub dropped: usize,
    /// Individual fields replaced by a default
    pub defaulted_fields: usize,
}

pub struct UniverseLoader;

impl UniverseLoader {
    pub fn load_file(path: &Path) -> Result<(Vec<Security>, LoadReport), LoadError> {
        let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::load_str(&content)
    }

    pub fn load_str(content: &str) -> Result<(Vec<Security>, LoadReport), LoadError> {
        let value: Value = serde_json::from_str(content)?;
        Self::load_value(value)
    }

    pub fn load_value(value: Value) -> Result<(Vec<Security>, LoadReport), LoadError> {
        let records = match value {
            Value::Array(records) => records,
            Value::Object(_) => return Err(LoadError::Shape("an object")),
            Value::String(_) => return Err(LoadError::Shape("a string")),
            Value::Number(_) => return Err(LoadError::Shape("a number")),
            Value::Bool(_) => return Err(LoadError::Shape("a boolean")),
            Value::Null => return Err(LoadError::Shape("null")),
        };

        let mut report = LoadReport::default();
        let mut seen: HashSet<String> = HashSet::new();
        let mut securities = Vec::with_capacity(records.len());

        for record in &records {
            let Some(fields) = record.as_object() else {
                report.dropped += 1;
                continue;
            };
            let Some(ticker) = text(fields, TICKER_KEYS) else {
                report.dropped += 1;
                continue;
            };
            if !seen.insert(ticker.clone()) {
                warn!(ticker = %ticker, "Duplicate ticker dropped");
                report.dropped += 1;
                continue;
            }

            let mut defaulted = 0usize;
            let mut label = |keys: &[&str]| {
                text(fields, keys).unwrap_or_else(|| {
                    defaulted += 1;
                    UNKNOWN_LABEL.to_string()
                })
            };
            let name = label(NAME_KEYS);
            let sector = label(SECTOR_KEYS);
            let industry = label(INDUSTRY_KEYS);

            let mut amount = |keys: &[&str], non_negative: bool| {
                number(fields, keys)
                    .filter(|v| !non_negative || *v >= 0.0)
                    .unwrap_or_else(|| {
                        defaulted += 1;
                        0.0
                    })
            };
            let signal = amount(SIGNAL_KEYS, false);
            let price = amount(PRICE_KEYS, true);
            let volume = amount(VOLUME_KEYS, true);

            report.defaulted_fields += defaulted;
            securities.push(Security {
                ticker,
                name,
                sector,
                industry,
                signal,
                price,
                volume,
            });
        }

        report.loaded = securities.len();
        if report.dropped > 0 || report.defaulted_fields > 0 {
            warn!(
                dropped = report.dropped,
                defaulted_fields = report.defaulted_fields,
                "Data-quality defaults applied to universe"
            );
        }
        debug!(loaded = report.loaded, "Universe loaded");

        Ok((securities, report))
    }
}

fn lookup<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| fields.get(*k)).filter(|v| !v.is_null())
}

/// Non-blank string, or a number rendered as text.
fn text(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    match lookup(fields, keys)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Finite number, or a string that parses to one.
fn number(fields: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    let parsed = match lookup(fields, keys)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_source_column_names() {
        let json = r#"[
            {"TICKER": "AAPL", "NAME": "Apple Inc", "SECTOR": "Technology",
             "INDUSTRY": "Consumer Electronics", "P_NN": 0.042, "CLOSE": 190.5, "VOLUME": 55000000}
        ]"#;
        let (securities, report) = UniverseLoader::load_str(json).unwrap();

        assert_eq!(report, LoadReport { loaded: 1, dropped: 0, defaulted_fields: 0 });
        assert_eq!(securities[0].ticker, "AAPL");
        assert_eq!(securities[0].industry, "Consumer Electronics");
        assert_eq!(securities[0].signal, 0.042);
        assert_eq!(securities[0].volume, 55_000_000.0);
    }

    #[test]
    fn test_signals_load_bit_exact() {
        let signals: [f64; 5] = [0.09833333333333333, -0.09833333333333333, 0.02, 1.0 / 3.0, 5e-324];
        let records: Vec<serde_json::Value> = signals
            .iter()
            .enumerate()
            .map(|(i, s)| serde_json::json!({"TICKER": format!("T{}", i), "P_NN": s}))
            .collect();
        let json = serde_json::to_string(&records).unwrap();

        let (securities, _) = UniverseLoader::load_str(&json).unwrap();
        let loaded: Vec<u64> = securities.iter().map(|s| s.signal.to_bits()).collect();
        let expected: Vec<u64> = signals.iter().map(|s| s.to_bits()).collect();
        assert_eq!(loaded, expected);
    }

    #[test]
    fn test_load_lowercase_aliases() {
        let json = r#"[{"ticker": "X", "name": "X Corp", "sector": "Materials",
                        "industry": "Steel", "signal": -0.01, "price": 30, "volume": 1000}]"#;
        let (securities, _) = UniverseLoader::load_str(json).unwrap();
        assert_eq!(securities[0].sector, "Materials");
        assert_eq!(securities[0].price, 30.0);
    }

    #[test]
    fn test_defaults_and_drops() {
        let json = r#"[
            {"TICKER": "", "P_NN": 0.1},
            {"NAME": "No ticker"},
            {"TICKER": "OK", "SECTOR": "  ", "P_NN": "abc", "CLOSE": "12.5", "VOLUME": -5},
            {"TICKER": "OK", "P_NN": 0.3},
            42
        ]"#;
        let (securities, report) = UniverseLoader::load_str(json).unwrap();

        assert_eq!(report.loaded, 1);
        assert_eq!(report.dropped, 4);
        // name, sector, industry, signal, volume
        assert_eq!(report.defaulted_fields, 5);

        let s = &securities[0];
        assert_eq!(s.sector, UNKNOWN_LABEL);
        assert_eq!(s.industry, UNKNOWN_LABEL);
        assert_eq!(s.signal, 0.0);
        assert_eq!(s.price, 12.5);
        assert_eq!(s.volume, 0.0);
    }

    #[test]
    fn test_rejects_non_array() {
        let err = UniverseLoader::load_str(r#"{"TICKER": "A"}"#).unwrap_err();
        assert!(matches!(err, LoadError::Shape("an object")));

        let err = UniverseLoader::load_str("not json").unwrap_err();
        assert!(matches!(err, LoadError::Json(_)));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"TICKER": "F", "P_NN": 0.02, "CLOSE": 12, "VOLUME": 40000000}}]"#).unwrap();

        let (securities, report) = UniverseLoader::load_file(file.path()).unwrap();
        assert_eq!(report.loaded, 1);
        assert_eq!(securities[0].ticker, "F");
    }

    #[test]
    fn test_error_conversion_exit_codes() {
        let shape: squeeze_common::Error = LoadError::Shape("null").into();
        assert_eq!(shape.exit_code(), 3);

        let io = UniverseLoader::load_file(Path::new("/nonexistent/universe.json")).unwrap_err();
        let io: squeeze_common::Error = io.into();
        assert_eq!(io.exit_code(), 4);
    }

    #[test]
    fn test_load_missing_file() {
        let err = UniverseLoader::load_file(Path::new("/nonexistent/universe.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/universe.json"));
    }
}
