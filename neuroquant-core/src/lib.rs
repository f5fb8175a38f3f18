//! NeuroQuant Core: a discrete-action single-asset trading environment.
//!
//! This crate contains:
//! - Domain types (bars, indicator-enriched frames, series, portfolio, actions)
//! - Trailing-window indicators (SMA, EMA, RSI, MACD) with NaN warmup
//! - The `TradingEnv` episode state machine (reset / step / observation)
//! - Series providers (Yahoo chart API, CSV import, synthetic) and the
//!   enrichment pipeline that turns raw bars into a validated series
//! - Deterministic seed derivation for reproducible evaluation

pub mod data;
pub mod domain;
pub mod env;
pub mod indicators;
pub mod rng;
