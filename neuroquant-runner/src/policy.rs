//! Policies: anything that maps an observation to an action.
//!
//! `Policy` is the boundary between the environment and whatever decides what
//! to do. Learning agents plug in here; the built-in rule policies serve as
//! baselines and smoke tests.

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use neuroquant_core::domain::{Action, PortfolioState};
use neuroquant_core::env::Observation;

/// Episode state handed to a policy alongside the observation.
///
/// Carries full-precision values the `f32` observation rounds away.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeContext {
    pub step: usize,
    pub max_step: usize,
    pub close_price: f64,
    pub portfolio: PortfolioState,
}

impl EpisodeContext {
    pub fn can_afford_lot(&self) -> bool {
        self.portfolio.cash_balance >= self.close_price
    }

    pub fn holds_shares(&self) -> bool {
        self.portfolio.shares_held > 0
    }
}

pub trait Policy: Send {
    fn name(&self) -> &str;

    fn act(&mut self, observation: &Observation, ctx: &EpisodeContext) -> Action;

    /// Called once per episode before the first `act`.
    fn on_reset(&mut self) {}
}

// ── Built-in policies ────────────────────────────────────────────────

/// Uniform over the three actions.
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn name(&self) -> &str {
        "random"
    }

    fn act(&mut self, _observation: &Observation, _ctx: &EpisodeContext) -> Action {
        Action::ALL[self.rng.gen_range(0..Action::COUNT)]
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HoldPolicy;

impl Policy for HoldPolicy {
    fn name(&self) -> &str {
        "hold"
    }

    fn act(&mut self, _observation: &Observation, _ctx: &EpisodeContext) -> Action {
        Action::Hold
    }
}

/// Buys a lot whenever cash covers it and never sells.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuyAndHoldPolicy;

impl Policy for BuyAndHoldPolicy {
    fn name(&self) -> &str {
        "buy_and_hold"
    }

    fn act(&mut self, _observation: &Observation, ctx: &EpisodeContext) -> Action {
        if ctx.can_afford_lot() {
            Action::Buy
        } else {
            Action::Hold
        }
    }
}

/// Replays a fixed action list, then holds.
#[derive(Debug, Clone)]
pub struct ScriptedPolicy {
    actions: Vec<Action>,
    cursor: usize,
}

impl ScriptedPolicy {
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions, cursor: 0 }
    }
}

impl Policy for ScriptedPolicy {
    fn name(&self) -> &str {
        "scripted"
    }

    fn act(&mut self, _observation: &Observation, _ctx: &EpisodeContext) -> Action {
        let action = self.actions.get(self.cursor).copied().unwrap_or(Action::Hold);
        self.cursor += 1;
        action
    }

    fn on_reset(&mut self) {
        self.cursor = 0;
    }
}

/// Mean-reversion rule on RSI: buy oversold, sell overbought.
#[derive(Debug, Clone, Copy)]
pub struct RsiThresholdPolicy {
    oversold: f64,
    overbought: f64,
}

impl RsiThresholdPolicy {
    pub fn new(oversold: f64, overbought: f64) -> Self {
        Self {
            oversold,
            overbought,
        }
    }
}

impl Default for RsiThresholdPolicy {
    fn default() -> Self {
        Self::new(30.0, 70.0)
    }
}

impl Policy for RsiThresholdPolicy {
    fn name(&self) -> &str {
        "rsi_threshold"
    }

    fn act(&mut self, observation: &Observation, ctx: &EpisodeContext) -> Action {
        let rsi = f64::from(observation.rsi());
        if rsi < self.oversold && ctx.can_afford_lot() {
            Action::Buy
        } else if rsi > self.overbought && ctx.holds_shares() {
            Action::Sell
        } else {
            Action::Hold
        }
    }
}

// ── Serializable selection ───────────────────────────────────────────

/// Serializable policy selection, as written in run configs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PolicyKind {
    Random,
    Hold,
    BuyAndHold,
    Scripted { actions: Vec<Action> },
    RsiThreshold { oversold: f64, overbought: f64 },
}

impl PolicyKind {
    pub fn label(&self) -> &'static str {
        match self {
            PolicyKind::Random => "random",
            PolicyKind::Hold => "hold",
            PolicyKind::BuyAndHold => "buy_and_hold",
            PolicyKind::Scripted { .. } => "scripted",
            PolicyKind::RsiThreshold { .. } => "rsi_threshold",
        }
    }

    /// Whether episodes differ by seed.
    pub fn is_stochastic(&self) -> bool {
        matches!(self, PolicyKind::Random)
    }

    pub fn validate(&self) -> Result<(), String> {
        if let PolicyKind::RsiThreshold {
            oversold,
            overbought,
        } = self
        {
            let in_range = |v: f64| (0.0..=100.0).contains(&v);
            if !in_range(*oversold) || !in_range(*overbought) || oversold >= overbought {
                return Err(format!(
                    "rsi_threshold needs 0 <= oversold < overbought <= 100, got {oversold}/{overbought}"
                ));
            }
        }
        Ok(())
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parses CLI spellings: `random`, `hold`, `buy_and_hold`, `rsi_threshold`,
/// `rsi_threshold:25:75`, `scripted:BUY,HOLD,SELL`.
impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (head, rest) = match s.split_once(':') {
            Some((h, r)) => (h, Some(r)),
            None => (s, None),
        };
        let kind = match (head.trim().to_ascii_lowercase().as_str(), rest) {
            ("random", None) => PolicyKind::Random,
            ("hold", None) => PolicyKind::Hold,
            ("buy_and_hold", None) => PolicyKind::BuyAndHold,
            ("rsi_threshold", None) => PolicyKind::RsiThreshold {
                oversold: 30.0,
                overbought: 70.0,
            },
            ("rsi_threshold", Some(bounds)) => {
                let (lo, hi) = bounds
                    .split_once(':')
                    .ok_or_else(|| format!("expected rsi_threshold:LOW:HIGH, got '{s}'"))?;
                let parse = |v: &str| {
                    v.trim()
                        .parse::<f64>()
                        .map_err(|e| format!("bad rsi bound '{v}': {e}"))
                };
                PolicyKind::RsiThreshold {
                    oversold: parse(lo)?,
                    overbought: parse(hi)?,
                }
            }
            ("scripted", Some(list)) => {
                let actions = list
                    .split(',')
                    .filter(|a| !a.trim().is_empty())
                    .map(|a| parse_action(a.trim()))
                    .collect::<Result<Vec<_>, _>>()?;
                PolicyKind::Scripted { actions }
            }
            _ => {
                return Err(format!(
                    "unknown policy '{s}'. Valid: random, hold, buy_and_hold, rsi_threshold[:LOW:HIGH], scripted:A,B,..."
                ))
            }
        };
        kind.validate()?;
        Ok(kind)
    }
}

fn parse_action(s: &str) -> Result<Action, String> {
    match s.to_ascii_uppercase().as_str() {
        "HOLD" | "0" => Ok(Action::Hold),
        "BUY" | "1" => Ok(Action::Buy),
        "SELL" | "2" => Ok(Action::Sell),
        _ => Err(format!("unknown action '{s}'")),
    }
}

/// Instantiate a policy. `seed` only matters for stochastic kinds.
pub fn build_policy(kind: &PolicyKind, seed: u64) -> Box<dyn Policy> {
    match kind {
        PolicyKind::Random => Box::new(RandomPolicy::new(seed)),
        PolicyKind::Hold => Box::new(HoldPolicy),
        PolicyKind::BuyAndHold => Box::new(BuyAndHoldPolicy),
        PolicyKind::Scripted { actions } => Box::new(ScriptedPolicy::new(actions.clone())),
        PolicyKind::RsiThreshold {
            oversold,
            overbought,
        } => Box::new(RsiThresholdPolicy::new(*oversold, *overbought)),
    }
}
