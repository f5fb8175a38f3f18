//! Serializable run configuration.
//!
//! A run is described by one TOML file:
//!
//! ```toml
//! [data]
//! symbol = "AAPL"
//! start = "2018-01-01"
//! end = "2023-12-31"
//! processed_dir = "data/processed"
//! source = { type = "yahoo" }
//!
//! [indicators]
//! rsi_period = 14
//!
//! [environment]
//! initial_balance = 10000.0
//!
//! [evaluation]
//! policy = { type = "random" }
//! episodes = 10
//! seed = 42
//! ```
//!
//! Every section except `[data]` may be omitted; defaults match the
//! processed-series layout and a 10 000 starting balance.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use neuroquant_core::data::IndicatorSettings;
use neuroquant_core::env::EnvConfig;

use crate::policy::PolicyKind;

/// Content-addressed identifier of a run configuration.
pub type RunId = String;

/// Errors from loading or validating a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub data: DataSection,
    #[serde(default)]
    pub indicators: IndicatorSettings,
    #[serde(default)]
    pub environment: EnvConfig,
    #[serde(default)]
    pub evaluation: EvaluationSection,
}

/// Where raw bars come from when no processed series is on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    #[default]
    Yahoo,
    Csv {
        path: PathBuf,
    },
    Synthetic {
        #[serde(default)]
        seed: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSection {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default = "default_processed_dir")]
    pub processed_dir: PathBuf,
    #[serde(default)]
    pub source: SourceConfig,
}

fn default_processed_dir() -> PathBuf {
    PathBuf::from("data/processed")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationSection {
    pub policy: PolicyKind,
    pub episodes: usize,
    pub seed: u64,
}

impl Default for EvaluationSection {
    fn default() -> Self {
        Self {
            policy: PolicyKind::Random,
            episodes: 10,
            seed: 42,
        }
    }
}

/// Command-line overrides layered on top of a loaded configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOverrides {
    pub policy: Option<PolicyKind>,
    pub episodes: Option<usize>,
    pub seed: Option<u64>,
    pub initial_balance: Option<f64>,
}

impl RunOverrides {
    pub fn apply(&self, environment: &mut EnvConfig, evaluation: &mut EvaluationSection) {
        if let Some(policy) = &self.policy {
            evaluation.policy = policy.clone();
        }
        if let Some(episodes) = self.episodes {
            evaluation.episodes = episodes;
        }
        if let Some(seed) = self.seed {
            evaluation.seed = seed;
        }
        if let Some(balance) = self.initial_balance {
            environment.initial_balance = balance;
        }
    }
}

impl RunConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let data = &self.data;
        if data.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("data.symbol is empty".into()));
        }
        if data.start >= data.end {
            return Err(ConfigError::Invalid(format!(
                "data.start ({}) must be before data.end ({})",
                data.start, data.end
            )));
        }
        if self.evaluation.episodes == 0 {
            return Err(ConfigError::Invalid("evaluation.episodes must be >= 1".into()));
        }
        self.environment
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.indicators
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.evaluation
            .policy
            .validate()
            .map_err(ConfigError::Invalid)?;
        Ok(())
    }

    /// Applies `overrides` and re-validates. The run id of the result covers
    /// the effective settings.
    pub fn with_overrides(mut self, overrides: &RunOverrides) -> Result<Self, ConfigError> {
        overrides.apply(&mut self.environment, &mut self.evaluation);
        self.validate()?;
        Ok(self)
    }

    /// BLAKE3 of the canonical JSON form. Identical configs share an id.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&json).to_hex().to_string()
    }

    /// Processed-series path for this run's symbol.
    pub fn processed_path(&self) -> PathBuf {
        neuroquant_core::data::processed_path(&self.data.processed_dir, &self.data.symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[data]
symbol = "AAPL"
start = "2018-01-01"
end = "2023-12-31"
"#;

    #[test]
    fn minimal_config_fills_defaults() {
        let cfg = RunConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(cfg.data.processed_dir, PathBuf::from("data/processed"));
        assert_eq!(cfg.data.source, SourceConfig::Yahoo);
        assert_eq!(cfg.indicators, IndicatorSettings::default());
        assert_eq!(cfg.environment.initial_balance, 10_000.0);
        assert_eq!(cfg.evaluation.episodes, 10);
        assert_eq!(cfg.evaluation.policy, PolicyKind::Random);
        assert_eq!(
            cfg.processed_path(),
            PathBuf::from("data/processed/AAPL_processed.csv")
        );
    }

    #[test]
    fn full_config_parses() {
        let text = r#"
[data]
symbol = "MSFT"
start = "2020-01-01"
end = "2021-01-01"
processed_dir = "out"
source = { type = "csv", path = "raw/msft.csv" }

[indicators]
rsi_period = 7
sma_short = 10

[environment]
initial_balance = 2500.0

[evaluation]
episodes = 4
seed = 9
policy = { type = "rsi_threshold", oversold = 25.0, overbought = 75.0 }
"#;
        let cfg = RunConfig::from_toml(text).unwrap();
        assert_eq!(
            cfg.data.source,
            SourceConfig::Csv {
                path: PathBuf::from("raw/msft.csv")
            }
        );
        assert_eq!(cfg.indicators.rsi_period, 7);
        assert_eq!(cfg.indicators.sma_long, 50);
        assert_eq!(cfg.environment.initial_balance, 2500.0);
        assert_eq!(
            cfg.evaluation.policy,
            PolicyKind::RsiThreshold {
                oversold: 25.0,
                overbought: 75.0
            }
        );
    }

    #[test]
    fn rejects_inverted_dates() {
        let text = MINIMAL.replace("2018-01-01", "2024-06-01");
        assert!(matches!(
            RunConfig::from_toml(&text),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_negative_balance() {
        let text = format!("{MINIMAL}\n[environment]\ninitial_balance = -1.0\n");
        assert!(matches!(
            RunConfig::from_toml(&text),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            RunConfig::from_toml("[data\nsymbol="),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn run_id_is_deterministic_and_sensitive() {
        let a = RunConfig::from_toml(MINIMAL).unwrap();
        let mut b = a.clone();
        assert_eq!(a.run_id(), b.run_id());
        b.evaluation.seed += 1;
        assert_ne!(a.run_id(), b.run_id());
    }

    #[test]
    fn overrides_flow_into_run_id() {
        let base = RunConfig::from_toml(MINIMAL).unwrap();
        let same = base.clone().with_overrides(&RunOverrides::default()).unwrap();
        assert_eq!(base.run_id(), same.run_id());

        let reseeded = base
            .clone()
            .with_overrides(&RunOverrides {
                seed: Some(7),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(reseeded.evaluation.seed, 7);
        assert_ne!(base.run_id(), reseeded.run_id());

        let rebalanced = base
            .clone()
            .with_overrides(&RunOverrides {
                initial_balance: Some(500.0),
                policy: Some(PolicyKind::Hold),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(rebalanced.environment.initial_balance, 500.0);
        assert_eq!(rebalanced.evaluation.policy, PolicyKind::Hold);
        assert_ne!(base.run_id(), rebalanced.run_id());
    }

    #[test]
    fn overrides_are_validated() {
        let base = RunConfig::from_toml(MINIMAL).unwrap();
        let err = base
            .with_overrides(&RunOverrides {
                episodes: Some(0),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = RunConfig::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
