//! Single-episode driver: reset, ask the policy, step, record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use neuroquant_core::domain::Action;
use neuroquant_core::env::{EnvError, TradeOutcome, TradingEnv};

use crate::policy::{EpisodeContext, Policy};

/// One row of the step tape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: usize,
    pub date: NaiveDate,
    pub action: Action,
    pub trade: TradeOutcome,
    pub close: f64,
    pub cash: f64,
    pub shares: u64,
    pub net_worth: f64,
    pub reward: f64,
}

/// Full trace of one episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub symbol: String,
    pub policy: String,
    pub initial_balance: f64,
    pub steps: Vec<StepRecord>,
    /// Net worth at step 0 followed by the value after every step.
    pub net_worth_curve: Vec<f64>,
}

impl EpisodeRecord {
    pub fn final_net_worth(&self) -> f64 {
        self.net_worth_curve
            .last()
            .copied()
            .unwrap_or(self.initial_balance)
    }

    pub fn total_reward(&self) -> f64 {
        self.steps.iter().map(|s| s.reward).sum()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn count_trades(&self, outcome: TradeOutcome) -> usize {
        self.steps.iter().filter(|s| s.trade == outcome).count()
    }
}

/// Run `policy` on `env` from a fresh reset until termination.
pub fn run_episode(
    env: &mut TradingEnv,
    policy: &mut dyn Policy,
) -> Result<EpisodeRecord, EnvError> {
    let mut observation = env.reset();
    policy.on_reset();

    let max_step = env.max_step();
    let mut steps = Vec::with_capacity(max_step);
    let mut net_worth_curve = Vec::with_capacity(max_step + 1);
    net_worth_curve.push(env.net_worth());

    while !env.is_terminated() {
        let ctx = EpisodeContext {
            step: env.current_step(),
            max_step,
            close_price: env.current_frame().close_price,
            portfolio: *env.portfolio(),
        };
        let action = policy.act(&observation, &ctx);
        let result = env.step(action)?;

        let frame = env.current_frame();
        let portfolio = env.portfolio();
        steps.push(StepRecord {
            step: portfolio.current_step,
            date: frame.date,
            action,
            trade: result.trade,
            close: frame.close_price,
            cash: portfolio.cash_balance,
            shares: portfolio.shares_held,
            net_worth: portfolio.net_worth,
            reward: result.reward,
        });
        net_worth_curve.push(portfolio.net_worth);
        observation = result.observation;
    }

    let record = EpisodeRecord {
        symbol: env.series().symbol().to_string(),
        policy: policy.name().to_string(),
        initial_balance: env.config().initial_balance,
        steps,
        net_worth_curve,
    };
    debug!(
        policy = %record.policy,
        steps = record.len(),
        final_net_worth = record.final_net_worth(),
        "episode finished"
    );
    Ok(record)
}
