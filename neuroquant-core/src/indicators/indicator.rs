//! Indicator trait and the named-series container the pipeline fills.
//!
//! Indicators are pure functions: close history in, numeric series out.
//! They run once over the whole raw series before any frame is built.

use std::collections::HashMap;

/// Trait for close-price indicators.
///
/// Output has the same length as the input; the first `lookback()` values are
/// `f64::NAN` (warmup).
///
/// # Look-ahead guard
/// No value at index t may depend on closes after t. Computing over a
/// truncated series must reproduce the prefix of the full computation.
pub trait Indicator: Send + Sync {
    /// Column-style name (e.g., "sma_20", "rsi_14").
    fn name(&self) -> &str;

    /// Number of leading values that are warmup NaNs.
    fn lookback(&self) -> usize;

    fn compute(&self, closes: &[f64]) -> Vec<f64>;
}

/// Precomputed indicator series keyed by name.
#[derive(Debug, Clone, Default)]
pub struct IndicatorValues {
    series: HashMap<String, Vec<f64>>,
}

impl IndicatorValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.series.insert(name.into(), values);
    }

    /// Compute `indicator` over `closes` and store it under its own name.
    pub fn compute_and_insert(&mut self, indicator: &dyn Indicator, closes: &[f64]) {
        self.insert(indicator.name(), indicator.compute(closes));
    }

    /// Value of a named series at `index`.
    pub fn get(&self, name: &str, index: usize) -> Option<f64> {
        self.series.get(name).and_then(|v| v.get(index).copied())
    }

    pub fn get_series(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    /// True if every stored series has a finite value at `index`.
    pub fn complete_at(&self, index: usize) -> bool {
        self.series
            .values()
            .all(|v| v.get(index).is_some_and(|x| x.is_finite()))
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get() {
        let mut iv = IndicatorValues::new();
        iv.insert("sma_3", vec![f64::NAN, f64::NAN, 11.0, 12.0]);
        assert!(iv.get("sma_3", 0).unwrap().is_nan());
        assert_eq!(iv.get("sma_3", 2), Some(11.0));
        assert_eq!(iv.get("sma_3", 4), None);
        assert_eq!(iv.get("missing", 0), None);
    }

    #[test]
    fn complete_at_requires_every_series() {
        let mut iv = IndicatorValues::new();
        iv.insert("a", vec![f64::NAN, 1.0, 2.0]);
        iv.insert("b", vec![f64::NAN, f64::NAN, 3.0]);
        assert!(!iv.complete_at(0));
        assert!(!iv.complete_at(1));
        assert!(iv.complete_at(2));
        assert!(!iv.complete_at(3));
        assert_eq!(iv.len(), 2);
    }
}
