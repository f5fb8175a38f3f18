//! Trading simulation environment.
//!
//! A deterministic finite-horizon state machine: `reset()` starts an episode
//! at step 0, each `step(action)` advances one frame, applies the action at
//! the new close price, and returns the one-step change in net worth as the
//! reward. The episode terminates at the last frame of the series.

pub mod config;
pub mod error;
pub mod observation;
pub mod trading_env;

pub use config::{EnvConfig, DEFAULT_INITIAL_BALANCE, LOT_SIZE};
pub use error::EnvError;
pub use observation::{Observation, OBSERVATION_LEN};
pub use trading_env::{EnvStatus, StepResult, TradeOutcome, TradingEnv};
