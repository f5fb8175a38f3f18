//! Raw bars → indicator-augmented `MarketSeries`.
//!
//! Steps: order and de-duplicate by date, drop void bars, compute RSI / SMA
//! short / SMA long / MACD line / MACD signal over closes, then drop every
//! row where any indicator is still warming up.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::provider::DataError;
use crate::domain::series::MIN_SERIES_LEN;
use crate::domain::{Bar, MarketFrame, MarketSeries};
use crate::indicators::{Indicator, IndicatorValues, Macd, Rsi, Sma};

/// Indicator periods. Defaults: RSI 14, SMA 20/50, MACD 12/26/9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorSettings {
    pub rsi_period: usize,
    pub sma_short: usize,
    pub sma_long: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            sma_short: 20,
            sma_long: 50,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
        }
    }
}

impl IndicatorSettings {
    pub fn validate(&self) -> Result<(), DataError> {
        let periods = [
            ("rsi_period", self.rsi_period),
            ("sma_short", self.sma_short),
            ("sma_long", self.sma_long),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, p)| *p == 0) {
            return Err(DataError::Other(format!("indicator period {name} must be >= 1")));
        }
        if self.macd_fast >= self.macd_slow {
            return Err(DataError::Other(format!(
                "macd_fast ({}) must be shorter than macd_slow ({})",
                self.macd_fast, self.macd_slow
            )));
        }
        Ok(())
    }

    fn rsi(&self) -> Rsi {
        Rsi::new(self.rsi_period)
    }

    fn short(&self) -> Sma {
        Sma::new(self.sma_short)
    }

    fn long(&self) -> Sma {
        Sma::new(self.sma_long)
    }

    fn macd(&self) -> Macd {
        Macd::line(self.macd_fast, self.macd_slow, self.macd_signal)
    }

    fn macd_signal(&self) -> Macd {
        Macd::signal_line(self.macd_fast, self.macd_slow, self.macd_signal)
    }

    /// Rows dropped from the front of a clean bar series.
    pub fn warmup(&self) -> usize {
        [
            self.rsi().lookback(),
            self.short().lookback(),
            self.long().lookback(),
            self.macd().lookback(),
            self.macd_signal().lookback(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

/// Drop void bars and order by date; a later duplicate date wins.
fn clean_bars(mut bars: Vec<Bar>) -> Vec<Bar> {
    let before = bars.len();
    bars.retain(|b| !b.is_void() && b.close > 0.0);
    bars.sort_by_key(|b| b.date);

    let mut cleaned: Vec<Bar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match cleaned.last_mut() {
            Some(last) if last.date == bar.date => *last = bar,
            _ => cleaned.push(bar),
        }
    }

    if cleaned.len() < before {
        warn!(
            dropped = before - cleaned.len(),
            "dropped void or duplicate bars"
        );
    }
    cleaned
}

/// Build the processed series the environment consumes.
pub fn build_series(
    symbol: &str,
    bars: Vec<Bar>,
    settings: &IndicatorSettings,
) -> Result<MarketSeries, DataError> {
    settings.validate()?;
    let bars = clean_bars(bars);
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let (rsi, short, long, macd, signal) = (
        settings.rsi(),
        settings.short(),
        settings.long(),
        settings.macd(),
        settings.macd_signal(),
    );
    let indicators: [&dyn Indicator; 5] = [&rsi, &short, &long, &macd, &signal];
    let mut values = IndicatorValues::new();
    for indicator in indicators {
        values.compute_and_insert(indicator, &closes);
    }

    let frames: Vec<MarketFrame> = bars
        .iter()
        .enumerate()
        .filter(|(i, _)| values.complete_at(*i))
        .map(|(i, bar)| MarketFrame {
            date: bar.date,
            close_price: bar.close,
            rsi: values.get(rsi.name(), i).unwrap_or(f64::NAN),
            sma_short: values.get(short.name(), i).unwrap_or(f64::NAN),
            sma_long: values.get(long.name(), i).unwrap_or(f64::NAN),
            macd_line: values.get(macd.name(), i).unwrap_or(f64::NAN),
            macd_signal: values.get(signal.name(), i).unwrap_or(f64::NAN),
        })
        .collect();

    if frames.len() < MIN_SERIES_LEN {
        return Err(DataError::InsufficientHistory {
            available: bars.len(),
            required: settings.warmup() + MIN_SERIES_LEN,
        });
    }

    let series = MarketSeries::new(symbol, frames)?;
    info!(
        symbol,
        raw_bars = bars.len(),
        rows = series.len(),
        first = %series.first().date,
        last = %series.last().date,
        "built processed series"
    );
    Ok(series)
}
