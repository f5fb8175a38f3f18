//! Moving Average Convergence/Divergence (MACD).
//!
//! Line = EMA(fast) - EMA(slow). Signal = EMA(signal) of the line, seeded
//! from the line's first valid value onward.
//! Lookbacks: line = slow - 1, signal = slow + signal - 2.

use super::ema::ema_of_series;
use super::indicator::Indicator;

/// Which MACD output a `Macd` instance produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdBand {
    Line,
    Signal,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    band: MacdBand,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize, band: MacdBand) -> Self {
        assert!(fast >= 1 && signal >= 1, "MACD periods must be >= 1");
        assert!(fast < slow, "MACD fast period must be shorter than slow period");
        let name = match band {
            MacdBand::Line => format!("macd_{fast}_{slow}_{signal}"),
            MacdBand::Signal => format!("macd_signal_{fast}_{slow}_{signal}"),
        };
        Self {
            fast,
            slow,
            signal,
            band,
            name,
        }
    }

    pub fn line(fast: usize, slow: usize, signal: usize) -> Self {
        Self::new(fast, slow, signal, MacdBand::Line)
    }

    pub fn signal_line(fast: usize, slow: usize, signal: usize) -> Self {
        Self::new(fast, slow, signal, MacdBand::Signal)
    }

    fn macd_line(&self, closes: &[f64]) -> Vec<f64> {
        let fast = ema_of_series(closes, self.fast);
        let slow = ema_of_series(closes, self.slow);
        fast.iter().zip(&slow).map(|(f, s)| f - s).collect()
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.band {
            MacdBand::Line => self.slow - 1,
            MacdBand::Signal => self.slow + self.signal - 2,
        }
    }

    fn compute(&self, closes: &[f64]) -> Vec<f64> {
        let line = self.macd_line(closes);
        if self.band == MacdBand::Line {
            return line;
        }

        let mut result = vec![f64::NAN; line.len()];
        let Some(start) = line.iter().position(|v| v.is_finite()) else {
            return result;
        };
        let smoothed = ema_of_series(&line[start..], self.signal);
        result[start..].copy_from_slice(&smoothed);
        result
    }
}
