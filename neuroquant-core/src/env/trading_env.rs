//! The trading environment state machine.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::config::{EnvConfig, LOT_SIZE};
use super::error::EnvError;
use super::observation::Observation;
use crate::domain::{Action, MarketFrame, MarketSeries, PortfolioState};

/// Episode lifecycle.
///
/// `Ready` while `current_step < max_step`, `Terminated` once the last frame
/// has been reached. Only `reset()` leaves `Terminated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvStatus {
    Ready,
    Terminated,
}

/// What the requested action did to the portfolio.
///
/// Rejected trades are policy no-ops, not errors: the state is unchanged
/// apart from the step advance, exactly as for `Held`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeOutcome {
    Held,
    Bought,
    Sold,
    RejectedInsufficientCash,
    RejectedNoShares,
}

impl TradeOutcome {
    /// A trade was requested but could not be executed.
    pub fn is_rejected(self) -> bool {
        matches!(
            self,
            TradeOutcome::RejectedInsufficientCash | TradeOutcome::RejectedNoShares
        )
    }

    /// Shares changed hands.
    pub fn is_fill(self) -> bool {
        matches!(self, TradeOutcome::Bought | TradeOutcome::Sold)
    }
}

/// Result of a single `step` call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub observation: Observation,
    /// One-step change in net worth.
    pub reward: f64,
    pub terminated: bool,
    /// Always false: no time-limit cutoff is modeled.
    pub truncated: bool,
    pub trade: TradeOutcome,
}

impl StepResult {
    pub fn is_done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// Single-instrument, single-share trading environment.
///
/// Owns its `PortfolioState`; the series is shared read-only, so parallel
/// episodes each construct their own environment over the same `Arc`.
#[derive(Debug, Clone)]
pub struct TradingEnv {
    series: Arc<MarketSeries>,
    config: EnvConfig,
    state: PortfolioState,
}

impl TradingEnv {
    /// Build an environment in the `Ready` state at step 0.
    pub fn new(series: impl Into<Arc<MarketSeries>>, config: EnvConfig) -> Result<Self, EnvError> {
        config.validate()?;
        Ok(Self {
            series: series.into(),
            config,
            state: PortfolioState::new(config.initial_balance),
        })
    }

    /// Validate raw frames and build an environment over them.
    pub fn from_frames(
        symbol: impl Into<String>,
        frames: Vec<MarketFrame>,
        config: EnvConfig,
    ) -> Result<Self, EnvError> {
        let series = MarketSeries::new(symbol, frames)?;
        Self::new(series, config)
    }

    /// Start a fresh episode and return the step-0 observation.
    pub fn reset(&mut self) -> Observation {
        self.state = PortfolioState::new(self.config.initial_balance);
        debug!(
            symbol = self.series.symbol(),
            initial_balance = self.config.initial_balance,
            "episode reset"
        );
        self.observation()
    }

    /// Advance one frame and apply `action` at the new close price.
    pub fn step(&mut self, action: Action) -> Result<StepResult, EnvError> {
        if self.is_terminated() {
            return Err(EnvError::EpisodeTerminated {
                step: self.state.current_step,
            });
        }

        self.state.current_step += 1;
        let close = self.current_frame().close_price;
        let trade = self.apply(action, close);

        let new_net_worth = self.state.value_at(close);
        let reward = new_net_worth - self.state.net_worth;
        self.state.net_worth = new_net_worth;

        let terminated = self.state.current_step >= self.max_step();

        trace!(
            step = self.state.current_step,
            %action,
            ?trade,
            close,
            cash = self.state.cash_balance,
            shares = self.state.shares_held,
            net_worth = new_net_worth,
            reward,
            "step"
        );

        Ok(StepResult {
            observation: self.observation(),
            reward,
            terminated,
            truncated: false,
            trade,
        })
    }

    /// Step with a raw action code as emitted by an external learner.
    ///
    /// Codes outside `{0, 1, 2}` are rejected before any state changes.
    pub fn step_code(&mut self, code: i64) -> Result<StepResult, EnvError> {
        let action = Action::try_from(code)?;
        self.step(action)
    }

    /// Observation at the current step.
    pub fn observation(&self) -> Observation {
        Observation::from_parts(self.current_frame(), &self.state)
    }

    fn apply(&mut self, action: Action, close: f64) -> TradeOutcome {
        match action {
            Action::Hold => TradeOutcome::Held,
            Action::Buy => {
                let cost = close * LOT_SIZE as f64;
                if self.state.cash_balance >= cost {
                    self.state.cash_balance -= cost;
                    self.state.shares_held += LOT_SIZE;
                    TradeOutcome::Bought
                } else {
                    debug!(
                        step = self.state.current_step,
                        cash = self.state.cash_balance,
                        close,
                        "buy rejected: insufficient cash"
                    );
                    TradeOutcome::RejectedInsufficientCash
                }
            }
            Action::Sell => {
                if self.state.shares_held >= LOT_SIZE {
                    self.state.cash_balance += close * LOT_SIZE as f64;
                    self.state.shares_held -= LOT_SIZE;
                    TradeOutcome::Sold
                } else {
                    debug!(
                        step = self.state.current_step,
                        "sell rejected: no shares held"
                    );
                    TradeOutcome::RejectedNoShares
                }
            }
        }
    }

    pub fn status(&self) -> EnvStatus {
        if self.is_terminated() {
            EnvStatus::Terminated
        } else {
            EnvStatus::Ready
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.state.current_step >= self.max_step()
    }

    /// Last valid step index (`N - 1`).
    pub fn max_step(&self) -> usize {
        self.series.last_index()
    }

    pub fn current_step(&self) -> usize {
        self.state.current_step
    }

    pub fn current_frame(&self) -> &MarketFrame {
        &self.series.frames()[self.state.current_step]
    }

    pub fn portfolio(&self) -> &PortfolioState {
        &self.state
    }

    pub fn net_worth(&self) -> f64 {
        self.state.net_worth
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn series(&self) -> &Arc<MarketSeries> {
        &self.series
    }

    /// Size of the discrete action space.
    pub fn action_count(&self) -> usize {
        Action::COUNT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::series::frames_from_closes;

    fn env(closes: &[f64], balance: f64) -> TradingEnv {
        TradingEnv::from_frames("TEST", frames_from_closes(closes), EnvConfig::new(balance))
            .unwrap()
    }

    #[test]
    fn buy_sell_hold_scenario() {
        let mut env = env(&[10.0, 12.0, 11.0, 11.0], 100.0);
        let obs = env.reset();
        assert_eq!(obs.close(), 10.0);
        assert_eq!(obs.cash(), 100.0);

        let r1 = env.step(Action::Buy).unwrap();
        assert_eq!(r1.trade, TradeOutcome::Bought);
        assert_eq!(env.portfolio().cash_balance, 88.0);
        assert_eq!(env.portfolio().shares_held, 1);
        assert_eq!(r1.reward, 0.0);
        assert!(!r1.terminated);

        let r2 = env.step(Action::Sell).unwrap();
        assert_eq!(r2.trade, TradeOutcome::Sold);
        assert_eq!(env.portfolio().cash_balance, 99.0);
        assert_eq!(env.portfolio().shares_held, 0);
        assert_eq!(r2.reward, -1.0);
        assert!(!r2.terminated);

        let r3 = env.step(Action::Hold).unwrap();
        assert_eq!(r3.trade, TradeOutcome::Held);
        assert_eq!(r3.reward, 0.0);
        assert!(r3.terminated);
        assert!(!r3.truncated);
        assert_eq!(env.net_worth(), 99.0);
    }

    #[test]
    fn construction_starts_ready_at_step_zero() {
        let env = env(&[10.0, 11.0], 50.0);
        assert_eq!(env.status(), EnvStatus::Ready);
        assert_eq!(env.current_step(), 0);
        assert_eq!(env.max_step(), 1);
        assert_eq!(env.net_worth(), 50.0);
    }

    #[test]
    fn unaffordable_buy_is_observable_no_op() {
        let mut env = env(&[10.0, 12.0, 13.0], 5.0);
        env.reset();
        let r = env.step(Action::Buy).unwrap();
        assert_eq!(r.trade, TradeOutcome::RejectedInsufficientCash);
        assert!(r.trade.is_rejected());
        assert_eq!(env.portfolio().cash_balance, 5.0);
        assert_eq!(env.portfolio().shares_held, 0);
        assert_eq!(r.reward, 0.0);
    }

    #[test]
    fn buy_with_exact_cash_succeeds() {
        let mut env = env(&[10.0, 12.0, 13.0], 12.0);
        let r = env.step(Action::Buy).unwrap();
        assert_eq!(r.trade, TradeOutcome::Bought);
        assert_eq!(env.portfolio().cash_balance, 0.0);
        assert_eq!(env.portfolio().shares_held, 1);
    }

    #[test]
    fn sell_without_shares_is_observable_no_op() {
        let mut env = env(&[10.0, 12.0, 13.0], 100.0);
        let r = env.step(Action::Sell).unwrap();
        assert_eq!(r.trade, TradeOutcome::RejectedNoShares);
        assert_eq!(env.portfolio().cash_balance, 100.0);
    }

    #[test]
    fn held_shares_earn_mark_to_market_reward() {
        let mut env = env(&[10.0, 10.0, 15.0], 100.0);
        env.step(Action::Buy).unwrap();
        let r = env.step(Action::Hold).unwrap();
        assert_eq!(r.reward, 5.0);
        assert_eq!(env.net_worth(), 105.0);
    }

    #[test]
    fn stepping_after_termination_is_rejected() {
        let mut env = env(&[10.0, 11.0], 100.0);
        assert!(env.step(Action::Hold).unwrap().terminated);
        assert_eq!(env.status(), EnvStatus::Terminated);

        let before = *env.portfolio();
        let err = env.step(Action::Buy).unwrap_err();
        assert_eq!(err, EnvError::EpisodeTerminated { step: 1 });
        assert_eq!(*env.portfolio(), before);
    }

    #[test]
    fn reset_leaves_terminated_state() {
        let mut env = env(&[10.0, 11.0], 100.0);
        env.step(Action::Buy).unwrap();
        let obs = env.reset();
        assert_eq!(env.status(), EnvStatus::Ready);
        assert_eq!(env.current_step(), 0);
        assert_eq!(env.portfolio().cash_balance, 100.0);
        assert_eq!(env.portfolio().shares_held, 0);
        assert_eq!(obs.shares(), 0.0);
    }

    #[test]
    fn invalid_code_is_rejected_without_advancing() {
        let mut env = env(&[10.0, 11.0, 12.0], 100.0);
        let err = env.step_code(7).unwrap_err();
        assert_eq!(err, EnvError::InvalidAction(7));
        assert_eq!(env.current_step(), 0);

        let r = env.step_code(1).unwrap();
        assert_eq!(r.trade, TradeOutcome::Bought);
    }

    #[test]
    fn rejects_short_series_at_construction() {
        let err = TradingEnv::from_frames("TEST", frames_from_closes(&[10.0]), EnvConfig::default())
            .unwrap_err();
        assert!(matches!(err, EnvError::InvalidSeries(_)));
    }

    #[test]
    fn rejects_negative_balance_at_construction() {
        let err = TradingEnv::from_frames(
            "TEST",
            frames_from_closes(&[10.0, 11.0]),
            EnvConfig::new(-5.0),
        )
        .unwrap_err();
        assert_eq!(err, EnvError::InvalidInitialBalance(-5.0));
    }

    #[test]
    fn observation_reflects_portfolio_after_trade() {
        let mut env = env(&[10.0, 12.0, 11.0], 100.0);
        let r = env.step(Action::Buy).unwrap();
        assert_eq!(r.observation.close(), 12.0);
        assert_eq!(r.observation.cash(), 88.0);
        assert_eq!(r.observation.shares(), 1.0);
    }
}
