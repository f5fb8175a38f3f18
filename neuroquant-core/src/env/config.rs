//! Environment configuration.

use serde::{Deserialize, Serialize};

use super::error::EnvError;

/// Starting cash when no balance is configured.
pub const DEFAULT_INITIAL_BALANCE: f64 = 10_000.0;

/// Shares traded per BUY/SELL. Fixed: variable position sizing is not modeled.
pub const LOT_SIZE: u64 = 1;

/// Immutable environment configuration, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    /// Cash balance restored by every reset.
    pub initial_balance: f64,
}

impl EnvConfig {
    pub fn new(initial_balance: f64) -> Self {
        Self { initial_balance }
    }

    pub fn validate(&self) -> Result<(), EnvError> {
        if !self.initial_balance.is_finite() || self.initial_balance < 0.0 {
            return Err(EnvError::InvalidInitialBalance(self.initial_balance));
        }
        Ok(())
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            initial_balance: DEFAULT_INITIAL_BALANCE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_balance_is_ten_thousand() {
        assert_eq!(EnvConfig::default().initial_balance, 10_000.0);
    }

    #[test]
    fn zero_balance_is_valid() {
        assert!(EnvConfig::new(0.0).validate().is_ok());
    }

    #[test]
    fn negative_or_nan_balance_is_rejected() {
        assert!(EnvConfig::new(-1.0).validate().is_err());
        assert!(EnvConfig::new(f64::NAN).validate().is_err());
        assert!(EnvConfig::new(f64::INFINITY).validate().is_err());
    }

    #[test]
    fn missing_field_falls_back_to_default() {
        let cfg: EnvConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, EnvConfig::default());
    }
}
