//! Environment error taxonomy.
//!
//! Configuration errors surface from `TradingEnv::new`. Protocol misuse
//! surfaces from `step`/`step_code` and never mutates state. Unaffordable buys
//! and empty-inventory sells are not errors; see `TradeOutcome`.

use thiserror::Error;

use crate::domain::SeriesError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvError {
    #[error("invalid series: {0}")]
    InvalidSeries(#[from] SeriesError),

    #[error("initial balance must be finite and >= 0, got {0}")]
    InvalidInitialBalance(f64),

    #[error("episode terminated at step {step}; call reset() before stepping again")]
    EpisodeTerminated { step: usize },

    #[error("invalid action code {0}; expected 0 (HOLD), 1 (BUY) or 2 (SELL)")]
    InvalidAction(i64),
}
