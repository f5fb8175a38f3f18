//! Synthetic bars for offline development.
//!
//! A seeded random walk from 100.0 over weekdays. The output is clearly fake
//! and is tagged `DataSource::Synthetic` wherever it flows.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{DataError, DataProvider, DataSource, FetchResult};
use crate::domain::Bar;

/// Generate weekday bars over `[start, end]`, deterministic in `(symbol, seed)`.
pub fn synthetic_bars(symbol: &str, start: NaiveDate, end: NaiveDate, seed: u64) -> Vec<Bar> {
    let mut hasher = blake3::Hasher::new();
    hasher.update(symbol.as_bytes());
    hasher.update(&seed.to_le_bytes());
    let mut rng = StdRng::from_seed(*hasher.finalize().as_bytes());

    let mut bars = Vec::new();
    let mut price = 100.0_f64;
    let mut current = start;

    while current <= end {
        if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));

        bars.push(Bar {
            date: current,
            open,
            high,
            low,
            close,
            volume: rng.gen_range(500_000..5_000_000u64),
            adj_close: close,
        });

        price = close;
        current += chrono::Duration::days(1);
    }

    bars
}

/// Provider wrapper around `synthetic_bars`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticProvider {
    pub seed: u64,
}

impl SyntheticProvider {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let bars = synthetic_bars(symbol, start, end, self.seed);
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
            source: DataSource::Synthetic,
        })
    }

    fn is_available(&self) -> bool {
        true
    }
}
