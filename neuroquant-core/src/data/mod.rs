//! Market series provider: raw bar retrieval, indicator enrichment, and
//! processed-series persistence.

pub mod csv_import;
pub mod persist;
pub mod pipeline;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use csv_import::CsvProvider;
pub use persist::{
    processed_path, read_series_csv, series_hash, symbol_from_path, write_series_csv,
};
pub use pipeline::{build_series, IndicatorSettings};
pub use provider::{DataError, DataProvider, DataSource, FetchResult};
pub use synthetic::{synthetic_bars, SyntheticProvider};
pub use yahoo::YahooProvider;
