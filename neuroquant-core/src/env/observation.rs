//! Observation vector handed to policies.

use serde::{Deserialize, Serialize};

use crate::domain::{MarketFrame, PortfolioState};

/// Number of observation components.
pub const OBSERVATION_LEN: usize = 7;

/// Fixed-order observation:
/// `[close, rsi, sma_short, sma_long, macd_line, cash_balance, shares_held]`.
///
/// Consumers depend on this exact order and on the f32 width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation(pub [f32; OBSERVATION_LEN]);

impl Observation {
    pub const CLOSE: usize = 0;
    pub const RSI: usize = 1;
    pub const SMA_SHORT: usize = 2;
    pub const SMA_LONG: usize = 3;
    pub const MACD: usize = 4;
    pub const CASH: usize = 5;
    pub const SHARES: usize = 6;

    pub fn from_parts(frame: &MarketFrame, portfolio: &PortfolioState) -> Self {
        Self([
            frame.close_price as f32,
            frame.rsi as f32,
            frame.sma_short as f32,
            frame.sma_long as f32,
            frame.macd_line as f32,
            portfolio.cash_balance as f32,
            portfolio.shares_held as f32,
        ])
    }

    pub fn as_array(&self) -> &[f32; OBSERVATION_LEN] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.0.to_vec()
    }

    pub fn close(&self) -> f32 {
        self.0[Self::CLOSE]
    }

    pub fn rsi(&self) -> f32 {
        self.0[Self::RSI]
    }

    pub fn cash(&self) -> f32 {
        self.0[Self::CASH]
    }

    pub fn shares(&self) -> f32 {
        self.0[Self::SHARES]
    }

    /// Net worth as seen through the observation (f32 precision).
    pub fn net_worth(&self) -> f32 {
        self.cash() + self.shares() * self.close()
    }
}

impl From<Observation> for [f32; OBSERVATION_LEN] {
    fn from(obs: Observation) -> Self {
        obs.0
    }
}
