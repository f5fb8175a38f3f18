//! PortfolioState: cash, shares, and the derived net worth.

use serde::{Deserialize, Serialize};

/// Mutable portfolio state owned by a single trading environment.
///
/// `net_worth` is a cached value of `cash_balance + shares_held * close` at
/// `current_step`. The environment recomputes it after every transition; it
/// is never updated on its own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioState {
    pub cash_balance: f64,
    pub shares_held: u64,
    pub net_worth: f64,
    pub current_step: usize,
}

impl PortfolioState {
    /// Fresh episode state: all cash, no shares, step 0.
    pub fn new(initial_balance: f64) -> Self {
        Self {
            cash_balance: initial_balance,
            shares_held: 0,
            net_worth: initial_balance,
            current_step: 0,
        }
    }

    /// Mark-to-market value at the given close price.
    pub fn value_at(&self, close_price: f64) -> f64 {
        self.cash_balance + self.shares_held as f64 * close_price
    }

    pub fn is_flat(&self) -> bool {
        self.shares_held == 0
    }
}
