//! Relative Strength Index (RSI).
//!
//! Average gains and losses are exponential means with alpha = 1/period,
//! normalised by the running weight sum (the "adjusted" EWM form), so the
//! first value already uses every change since the start of the series.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss). Lookback: period.

use super::indicator::Indicator;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, closes: &[f64]) -> Vec<f64> {
        let n = closes.len();
        let mut result = vec![f64::NAN; n];
        if n < self.period + 1 {
            return result;
        }

        let decay = 1.0 - 1.0 / self.period as f64;
        let (mut gain_sum, mut loss_sum, mut weight) = (0.0, 0.0, 0.0);
        for i in 1..n {
            let change = closes[i] - closes[i - 1];
            if change.is_nan() {
                break;
            }
            gain_sum = change.max(0.0) + decay * gain_sum;
            loss_sum = (-change).max(0.0) + decay * loss_sum;
            weight = 1.0 + decay * weight;
            if i >= self.period {
                result[i] = rsi_value(gain_sum / weight, loss_sum / weight);
            }
        }
        result
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
