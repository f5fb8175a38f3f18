//! Buy-and-hold reference: invest everything at the first close, mark at the last.

use serde::{Deserialize, Serialize};

use neuroquant_core::domain::MarketSeries;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub initial_price: f64,
    pub final_price: f64,
    pub shares: u64,
    pub final_net_worth: f64,
    pub total_return: f64,
}

/// Whole shares bought at the first close, cash remainder kept idle.
pub fn buy_and_hold_benchmark(series: &MarketSeries, initial_balance: f64) -> BenchmarkResult {
    let initial_price = series.first().close_price;
    let final_price = series.last().close_price;
    let shares = (initial_balance / initial_price).floor().max(0.0) as u64;
    let final_net_worth = initial_balance + shares as f64 * (final_price - initial_price);
    let total_return = if initial_balance > 0.0 {
        (final_net_worth - initial_balance) / initial_balance
    } else {
        0.0
    };
    BenchmarkResult {
        initial_price,
        final_price,
        shares,
        final_net_worth,
        total_return,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuroquant_core::domain::frames_from_closes;

    fn series(closes: &[f64]) -> MarketSeries {
        MarketSeries::new("B", frames_from_closes(closes)).unwrap()
    }

    #[test]
    fn buys_whole_shares_and_keeps_remainder() {
        let b = buy_and_hold_benchmark(&series(&[30.0, 10.0, 45.0]), 100.0);
        assert_eq!(b.shares, 3);
        assert_eq!(b.final_net_worth, 145.0);
        assert!((b.total_return - 0.45).abs() < 1e-12);
    }

    #[test]
    fn unaffordable_first_close_stays_in_cash() {
        let b = buy_and_hold_benchmark(&series(&[500.0, 900.0]), 100.0);
        assert_eq!(b.shares, 0);
        assert_eq!(b.final_net_worth, 100.0);
        assert_eq!(b.total_return, 0.0);
    }

    #[test]
    fn zero_balance_has_zero_return() {
        let b = buy_and_hold_benchmark(&series(&[5.0, 6.0]), 0.0);
        assert_eq!(b.final_net_worth, 0.0);
        assert_eq!(b.total_return, 0.0);
    }
}
