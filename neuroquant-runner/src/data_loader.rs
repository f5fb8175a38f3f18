//! Series resolution for the runner.
//!
//! Implements the fallback policy:
//! 1. If a processed series exists on disk (and `force` is off) → load it
//! 2. Otherwise fetch raw bars from the provider, enrich, and persist
//! 3. If the fetch fails and `synthetic_fallback` is on → synthetic bars (tagged)
//! 4. Otherwise → fail with the provider's error

use std::path::PathBuf;

use thiserror::Error;
use tracing::{info, warn};

use neuroquant_core::data::{
    build_series, processed_path, read_series_csv, series_hash, synthetic_bars, write_series_csv,
    CsvProvider, DataError, DataProvider, DataSource, IndicatorSettings, SyntheticProvider,
    YahooProvider,
};
use neuroquant_core::domain::MarketSeries;

use crate::config::{DataSection, SourceConfig};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("fetching '{symbol}' from {provider} failed: {source}")]
    FetchFailed {
        symbol: String,
        provider: String,
        #[source]
        source: DataError,
    },
    #[error("data error: {0}")]
    Data(#[from] DataError),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Rebuild even if a processed file exists.
    pub force: bool,
    /// Substitute synthetic bars when the provider fails.
    pub synthetic_fallback: bool,
}

/// A resolved series with provenance.
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub series: MarketSeries,
    pub source: DataSource,
    pub path: PathBuf,
    /// BLAKE3 over every frame value.
    pub dataset_hash: String,
}

impl LoadedSeries {
    pub fn is_synthetic(&self) -> bool {
        self.source == DataSource::Synthetic
    }
}

/// Instantiate the raw-bar provider named in the config.
pub fn provider_for(source: &SourceConfig) -> Result<Box<dyn DataProvider>, DataError> {
    Ok(match source {
        SourceConfig::Yahoo => Box::new(YahooProvider::new()?),
        SourceConfig::Csv { path } => Box::new(CsvProvider::new(path.clone())),
        SourceConfig::Synthetic { seed } => Box::new(SyntheticProvider::new(*seed)),
    })
}

pub fn load_series(
    data: &DataSection,
    indicators: &IndicatorSettings,
    provider: &dyn DataProvider,
    opts: &LoadOptions,
) -> Result<LoadedSeries, LoadError> {
    let path = processed_path(&data.processed_dir, &data.symbol);

    if !opts.force && path.is_file() {
        let series = read_series_csv(&data.symbol, &path)?;
        info!(
            symbol = %data.symbol,
            path = %path.display(),
            rows = series.len(),
            "loaded processed series"
        );
        return Ok(finish(series, DataSource::Processed, path));
    }

    let (bars, source) = match provider.fetch(&data.symbol, data.start, data.end) {
        Ok(fetched) => (fetched.bars, fetched.source),
        Err(e) if opts.synthetic_fallback => {
            warn!(
                symbol = %data.symbol,
                provider = provider.name(),
                error = %e,
                "fetch failed; generating synthetic bars, results will be tagged synthetic"
            );
            (
                synthetic_bars(&data.symbol, data.start, data.end, 0),
                DataSource::Synthetic,
            )
        }
        Err(e) => {
            return Err(LoadError::FetchFailed {
                symbol: data.symbol.clone(),
                provider: provider.name().to_string(),
                source: e,
            })
        }
    };
    if source == DataSource::Synthetic {
        warn!(symbol = %data.symbol, "using synthetic data");
    }

    let series = build_series(&data.symbol, bars, indicators)?;
    write_series_csv(&series, &path)?;
    Ok(finish(series, source, path))
}

fn finish(series: MarketSeries, source: DataSource, path: PathBuf) -> LoadedSeries {
    let dataset_hash = series_hash(&series);
    LoadedSeries {
        series,
        source,
        path,
        dataset_hash,
    }
}
