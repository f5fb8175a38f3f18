//! CSV import of raw daily bars.
//!
//! Accepts the layout Yahoo Finance exports (`Date,Open,High,Low,Close,Adj Close,Volume`)
//! as well as lower-case snake_case headers. Unparseable numeric cells (e.g.
//! `null`) become NaN so the pipeline can drop those rows as void bars.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use super::provider::{DataError, DataProvider, DataSource, FetchResult};
use crate::domain::Bar;

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date", alias = "date", deserialize_with = "de_date")]
    date: NaiveDate,
    #[serde(rename = "Open", alias = "open", deserialize_with = "csv::invalid_option")]
    open: Option<f64>,
    #[serde(rename = "High", alias = "high", deserialize_with = "csv::invalid_option")]
    high: Option<f64>,
    #[serde(rename = "Low", alias = "low", deserialize_with = "csv::invalid_option")]
    low: Option<f64>,
    #[serde(rename = "Close", alias = "close", deserialize_with = "csv::invalid_option")]
    close: Option<f64>,
    #[serde(
        rename = "Adj Close",
        alias = "adj_close",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    adj_close: Option<f64>,
    #[serde(
        rename = "Volume",
        alias = "volume",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    volume: Option<f64>,
}

impl CsvRow {
    fn into_bar(self) -> Bar {
        let close = self.close.unwrap_or(f64::NAN);
        Bar {
            date: self.date,
            open: self.open.unwrap_or(f64::NAN),
            high: self.high.unwrap_or(f64::NAN),
            low: self.low.unwrap_or(f64::NAN),
            close,
            volume: self.volume.map(|v| v.max(0.0) as u64).unwrap_or(0),
            adj_close: self.adj_close.unwrap_or(close),
        }
    }
}

/// Parse the leading `YYYY-MM-DD` of a date or datetime cell.
fn de_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let day = raw.trim().get(..10).unwrap_or(raw.trim());
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(serde::de::Error::custom)
}

/// Read every bar from a raw OHLCV CSV reader.
pub fn read_bars<R: std::io::Read>(reader: R) -> Result<Vec<Bar>, DataError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut bars = Vec::new();
    for row in rdr.deserialize::<CsvRow>() {
        bars.push(row?.into_bar());
    }
    Ok(bars)
}

/// Provider backed by a local raw OHLCV CSV file.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    path: PathBuf,
}

impl CsvProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv_import"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let file = std::fs::File::open(&self.path)?;
        let bars: Vec<Bar> = read_bars(file)?
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect();
        debug!(symbol, path = %self.path.display(), bars = bars.len(), "imported CSV bars");

        if bars.is_empty() {
            return Err(DataError::NoData {
                symbol: symbol.to_string(),
                start,
                end,
            });
        }
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::CsvImport,
        })
    }

    fn is_available(&self) -> bool {
        self.path.is_file()
    }
}
