//! Multi-episode evaluation.
//!
//! Episodes run in parallel on rayon, each with its own `TradingEnv` over a
//! shared `Arc<MarketSeries>`. Per-episode seeds come from `RngHierarchy`, so
//! results do not depend on the thread count.

use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use neuroquant_core::domain::MarketSeries;
use neuroquant_core::env::{EnvConfig, EnvError, TradingEnv};
use neuroquant_core::rng::RngHierarchy;

use crate::benchmark::{buy_and_hold_benchmark, BenchmarkResult};
use crate::config::ConfigError;
use crate::data_loader::LoadError;
use crate::episode::{run_episode, EpisodeRecord};
use crate::metrics::{mean_f64, std_dev, EpisodeMetrics};
use crate::policy::{build_policy, PolicyKind};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("environment error: {0}")]
    Env(#[from] EnvError),
    #[error("evaluation needs at least one episode")]
    NoEpisodes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeOutcome {
    pub index: u64,
    pub seed: u64,
    pub metrics: EpisodeMetrics,
    pub record: EpisodeRecord,
}

/// Cross-episode aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub episodes: usize,
    pub mean_final_net_worth: f64,
    pub std_final_net_worth: f64,
    pub min_final_net_worth: f64,
    pub max_final_net_worth: f64,
    pub mean_total_return: f64,
    pub mean_sharpe: f64,
    pub mean_max_drawdown: f64,
    /// Fraction of episodes whose final net worth beat buy-and-hold.
    pub beat_benchmark_rate: f64,
}

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub symbol: String,
    pub policy: PolicyKind,
    pub master_seed: u64,
    pub env_config: EnvConfig,
    pub outcomes: Vec<EpisodeOutcome>,
    pub summary: EvaluationSummary,
    pub benchmark: BenchmarkResult,
}

impl Evaluation {
    /// Highest final net worth; the lowest index wins ties.
    pub fn best_episode(&self) -> Option<&EpisodeOutcome> {
        self.outcomes.iter().fold(None, |best, o| match best {
            Some(b) if b.metrics.final_net_worth >= o.metrics.final_net_worth => Some(b),
            _ => Some(o),
        })
    }
}

/// Seed-derivation key: episodes of the same symbol and policy share a stream family.
fn run_key(series: &MarketSeries, policy: &PolicyKind) -> String {
    format!("{}/{}", series.symbol(), policy.label())
}

pub fn evaluate(
    series: Arc<MarketSeries>,
    env_config: EnvConfig,
    policy: &PolicyKind,
    episodes: usize,
    master_seed: u64,
) -> Result<Evaluation, RunError> {
    if episodes == 0 {
        return Err(RunError::NoEpisodes);
    }
    env_config.validate()?;

    let rng = RngHierarchy::new(master_seed);
    let key = run_key(&series, policy);
    info!(
        symbol = series.symbol(),
        policy = %policy,
        episodes,
        master_seed,
        frames = series.len(),
        "evaluation started"
    );

    let outcomes = (0..episodes as u64)
        .into_par_iter()
        .map(|index| -> Result<EpisodeOutcome, EnvError> {
            let seed = rng.sub_seed(&key, index);
            let mut env = TradingEnv::new(Arc::clone(&series), env_config)?;
            let mut agent = build_policy(policy, seed);
            let record = run_episode(&mut env, agent.as_mut())?;
            Ok(EpisodeOutcome {
                index,
                seed,
                metrics: EpisodeMetrics::compute(&record),
                record,
            })
        })
        .collect::<Result<Vec<_>, EnvError>>()?;

    let benchmark = buy_and_hold_benchmark(&series, env_config.initial_balance);
    let summary = summarize(&outcomes, &benchmark);
    info!(
        symbol = series.symbol(),
        mean_final_net_worth = summary.mean_final_net_worth,
        benchmark_final_net_worth = benchmark.final_net_worth,
        "evaluation finished"
    );

    Ok(Evaluation {
        symbol: series.symbol().to_string(),
        policy: policy.clone(),
        master_seed,
        env_config,
        outcomes,
        summary,
        benchmark,
    })
}

fn summarize(outcomes: &[EpisodeOutcome], benchmark: &BenchmarkResult) -> EvaluationSummary {
    let finals: Vec<f64> = outcomes.iter().map(|o| o.metrics.final_net_worth).collect();
    let beat = finals
        .iter()
        .filter(|&&v| v > benchmark.final_net_worth)
        .count();

    EvaluationSummary {
        episodes: outcomes.len(),
        mean_final_net_worth: mean_f64(&finals),
        std_final_net_worth: std_dev(&finals),
        min_final_net_worth: finals.iter().copied().fold(f64::INFINITY, f64::min),
        max_final_net_worth: finals.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        mean_total_return: mean_of(outcomes, |m| m.total_return),
        mean_sharpe: mean_of(outcomes, |m| m.sharpe),
        mean_max_drawdown: mean_of(outcomes, |m| m.max_drawdown),
        beat_benchmark_rate: if outcomes.is_empty() {
            0.0
        } else {
            beat as f64 / outcomes.len() as f64
        },
    }
}

fn mean_of(outcomes: &[EpisodeOutcome], field: impl Fn(&EpisodeMetrics) -> f64) -> f64 {
    let values: Vec<f64> = outcomes.iter().map(|o| field(&o.metrics)).collect();
    mean_f64(&values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuroquant_core::domain::{frames_from_closes, Action};

    fn series(closes: &[f64]) -> Arc<MarketSeries> {
        Arc::new(MarketSeries::new("EV", frames_from_closes(closes)).unwrap())
    }

    #[test]
    fn zero_episodes_is_an_error() {
        let err = evaluate(series(&[1.0, 2.0]), EnvConfig::default(), &PolicyKind::Hold, 0, 1)
            .unwrap_err();
        assert!(matches!(err, RunError::NoEpisodes));
    }

    #[test]
    fn invalid_balance_is_an_error() {
        let err = evaluate(series(&[1.0, 2.0]), EnvConfig::new(-5.0), &PolicyKind::Hold, 1, 1)
            .unwrap_err();
        assert!(matches!(err, RunError::Env(EnvError::InvalidInitialBalance(_))));
    }

    #[test]
    fn deterministic_policy_gives_identical_episodes() {
        let policy = PolicyKind::Scripted {
            actions: vec![Action::Buy, Action::Sell, Action::Hold],
        };
        let eval = evaluate(series(&[10.0, 12.0, 11.0, 11.0]), EnvConfig::new(100.0), &policy, 3, 7)
            .unwrap();
        assert_eq!(eval.outcomes.len(), 3);
        for o in &eval.outcomes {
            assert_eq!(o.metrics.final_net_worth, 99.0);
        }
        assert_eq!(eval.summary.std_final_net_worth, 0.0);
        assert_eq!(eval.best_episode().unwrap().index, 0);
        // Buy-and-hold: 10 shares at 10 → 100 + 10 × 1 = 110.
        assert_eq!(eval.benchmark.final_net_worth, 110.0);
        assert_eq!(eval.summary.beat_benchmark_rate, 0.0);
    }

    #[test]
    fn outcomes_are_ordered_by_index_with_distinct_seeds() {
        let eval = evaluate(
            series(&[10.0, 11.0, 9.0, 12.0, 13.0]),
            EnvConfig::new(50.0),
            &PolicyKind::Random,
            8,
            42,
        )
        .unwrap();
        let indices: Vec<u64> = eval.outcomes.iter().map(|o| o.index).collect();
        assert_eq!(indices, (0..8).collect::<Vec<_>>());
        let mut seeds: Vec<u64> = eval.outcomes.iter().map(|o| o.seed).collect();
        seeds.sort_unstable();
        seeds.dedup();
        assert_eq!(seeds.len(), 8);
    }
}
