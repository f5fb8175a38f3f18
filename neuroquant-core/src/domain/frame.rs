//! MarketFrame: one indicator-augmented row of the processed series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Point-in-time market snapshot consumed by the trading environment.
///
/// The serde field names double as the processed CSV column names.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketFrame {
    pub date: NaiveDate,
    #[serde(rename = "close")]
    pub close_price: f64,
    pub rsi: f64,
    pub sma_short: f64,
    pub sma_long: f64,
    #[serde(rename = "macd")]
    pub macd_line: f64,
    pub macd_signal: f64,
}

impl MarketFrame {
    /// Frame with neutral indicators: RSI 50, both SMAs at the close, flat MACD.
    pub fn flat(date: NaiveDate, close_price: f64) -> Self {
        Self {
            date,
            close_price,
            rsi: 50.0,
            sma_short: close_price,
            sma_long: close_price,
            macd_line: 0.0,
            macd_signal: 0.0,
        }
    }

    /// Returns the name of the first non-finite numeric field, if any.
    pub fn first_non_finite(&self) -> Option<&'static str> {
        [
            ("close", self.close_price),
            ("rsi", self.rsi),
            ("sma_short", self.sma_short),
            ("sma_long", self.sma_long),
            ("macd", self.macd_line),
            ("macd_signal", self.macd_signal),
        ]
        .into_iter()
        .find(|(_, v)| !v.is_finite())
        .map(|(name, _)| name)
    }
}
