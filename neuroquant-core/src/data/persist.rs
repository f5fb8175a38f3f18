//! Processed series persistence.
//!
//! One CSV per instrument at `{dir}/{SYMBOL}_processed.csv` with columns
//! `date,close,rsi,sma_short,sma_long,macd,macd_signal`. Floats are written
//! with shortest round-trip formatting, so a read reproduces the series bit
//! for bit.

use std::path::{Path, PathBuf};

use tracing::info;

use super::provider::DataError;
use crate::domain::{MarketFrame, MarketSeries};

const PROCESSED_SUFFIX: &str = "_processed.csv";

/// Conventional location of a symbol's processed series.
pub fn processed_path(dir: &Path, symbol: &str) -> PathBuf {
    dir.join(format!("{symbol}{PROCESSED_SUFFIX}"))
}

/// Recover the symbol from a processed file name, falling back to the stem.
pub fn symbol_from_path(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    match name.strip_suffix(PROCESSED_SUFFIX) {
        Some(symbol) => symbol.to_string(),
        None => path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or(name),
    }
}

/// Serialize frames as CSV into any writer.
pub fn write_frames<W: std::io::Write>(frames: &[MarketFrame], writer: W) -> Result<(), DataError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for frame in frames {
        wtr.serialize(frame)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write a series to `path`, creating parent directories.
pub fn write_series_csv(series: &MarketSeries, path: &Path) -> Result<(), DataError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_frames(series.frames(), file)?;
    info!(
        symbol = series.symbol(),
        rows = series.len(),
        path = %path.display(),
        "saved processed series"
    );
    Ok(())
}

/// Read frames from any CSV reader without validating them.
pub fn read_frames<R: std::io::Read>(reader: R) -> Result<Vec<MarketFrame>, DataError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut frames = Vec::new();
    for row in rdr.deserialize::<MarketFrame>() {
        frames.push(row?);
    }
    Ok(frames)
}

/// Load and validate a processed series.
pub fn read_series_csv(symbol: &str, path: &Path) -> Result<MarketSeries, DataError> {
    let file = std::fs::File::open(path)?;
    let frames = read_frames(file)?;
    Ok(MarketSeries::new(symbol, frames)?)
}

/// BLAKE3 fingerprint over the symbol and every frame value.
pub fn series_hash(series: &MarketSeries) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(series.symbol().as_bytes());
    for f in series.frames() {
        hasher.update(f.date.to_string().as_bytes());
        for v in [
            f.close_price,
            f.rsi,
            f.sma_short,
            f.sma_long,
            f.macd_line,
            f.macd_signal,
        ] {
            hasher.update(&v.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}
