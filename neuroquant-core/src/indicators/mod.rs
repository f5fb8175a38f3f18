//! Close-price indicators used to build market frames.
//!
//! RSI supplies momentum, the two SMAs supply trend, and MACD (line plus
//! signal) supplies trend reversals. MACD is exposed as two single-series
//! indicators so every output fits the `Indicator` trait.

pub mod ema;
pub mod indicator;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use ema::{ema_of_series, Ema};
pub use indicator::{Indicator, IndicatorValues};
pub use macd::{Macd, MacdBand};
pub use rsi::Rsi;
pub use sma::Sma;

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
