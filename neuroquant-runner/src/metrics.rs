//! Episode metrics: pure functions over a net-worth curve and step tape.
//!
//! Every metric is a pure function. Ratios annualize with 252 trading days,
//! one step per trading day.

use serde::{Deserialize, Serialize};

use neuroquant_core::env::TradeOutcome;

use crate::episode::EpisodeRecord;

const TRADING_DAYS: f64 = 252.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeMetrics {
    pub steps: usize,
    pub final_net_worth: f64,
    pub total_return: f64,
    pub total_reward: f64,
    pub max_drawdown: f64,
    pub sharpe: f64,
    pub sortino: f64,
    pub buys: usize,
    pub sells: usize,
    pub rejected: usize,
    /// Fraction of steps that ended holding shares.
    pub exposure: f64,
}

impl EpisodeMetrics {
    pub fn compute(record: &EpisodeRecord) -> Self {
        let curve = &record.net_worth_curve;
        Self {
            steps: record.len(),
            final_net_worth: record.final_net_worth(),
            total_return: total_return(curve),
            total_reward: record.total_reward(),
            max_drawdown: max_drawdown(curve),
            sharpe: sharpe_ratio(curve, 0.0),
            sortino: sortino_ratio(curve, 0.0),
            buys: record.count_trades(TradeOutcome::Bought),
            sells: record.count_trades(TradeOutcome::Sold),
            rejected: record.steps.iter().filter(|s| s.trade.is_rejected()).count(),
            exposure: exposure(record),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(curve: &[f64]) -> f64 {
    match (curve.first(), curve.last()) {
        (Some(&initial), Some(&last)) if curve.len() >= 2 && initial > 0.0 => {
            (last - initial) / initial
        }
        _ => 0.0,
    }
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
pub fn max_drawdown(curve: &[f64]) -> f64 {
    let Some(&first) = curve.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;
    for &v in curve {
        if v > peak {
            peak = v;
        }
        if peak > 0.0 {
            max_dd = max_dd.min((v - peak) / peak);
        }
    }
    max_dd
}

/// Annualized Sharpe ratio of per-step returns. 0.0 when variance vanishes.
pub fn sharpe_ratio(curve: &[f64], risk_free_rate: f64) -> f64 {
    let excess = excess_returns(curve, risk_free_rate);
    if excess.len() < 2 {
        return 0.0;
    }
    let std = std_dev(&excess);
    if std < 1e-15 {
        return 0.0;
    }
    mean_f64(&excess) / std * TRADING_DAYS.sqrt()
}

/// Annualized Sortino ratio (downside deviation only).
pub fn sortino_ratio(curve: &[f64], risk_free_rate: f64) -> f64 {
    let excess = excess_returns(curve, risk_free_rate);
    if excess.len() < 2 {
        return 0.0;
    }
    let downside: f64 = excess.iter().filter(|&&r| r < 0.0).map(|r| r * r).sum();
    if downside == 0.0 {
        return 0.0;
    }
    let downside_std = (downside / excess.len() as f64).sqrt();
    if downside_std < 1e-15 {
        return 0.0;
    }
    mean_f64(&excess) / downside_std * TRADING_DAYS.sqrt()
}

pub fn exposure(record: &EpisodeRecord) -> f64 {
    if record.is_empty() {
        return 0.0;
    }
    let held = record.steps.iter().filter(|s| s.shares > 0).count();
    held as f64 / record.len() as f64
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Per-step simple returns. A step from a non-positive value counts as 0.
pub fn step_returns(curve: &[f64]) -> Vec<f64> {
    curve
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

fn excess_returns(curve: &[f64], risk_free_rate: f64) -> Vec<f64> {
    let daily_rf = risk_free_rate / TRADING_DAYS;
    step_returns(curve).into_iter().map(|r| r - daily_rf).collect()
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::episode::StepRecord;
    use chrono::NaiveDate;
    use neuroquant_core::domain::Action;

    fn record(steps: &[(TradeOutcome, u64, f64)], initial: f64) -> EpisodeRecord {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let mut curve = vec![initial];
        let mut prev = initial;
        let steps = steps
            .iter()
            .enumerate()
            .map(|(i, &(trade, shares, nw))| {
                let reward = nw - prev;
                prev = nw;
                curve.push(nw);
                StepRecord {
                    step: i + 1,
                    date,
                    action: Action::Hold,
                    trade,
                    close: 10.0,
                    cash: 0.0,
                    shares,
                    net_worth: nw,
                    reward,
                }
            })
            .collect();
        EpisodeRecord {
            symbol: "T".into(),
            policy: "test".into(),
            initial_balance: initial,
            steps,
            net_worth_curve: curve,
        }
    }

    // ── Total return ──

    #[test]
    fn total_return_cases() {
        assert!((total_return(&[100.0, 105.0, 110.0]) - 0.1).abs() < 1e-12);
        assert!((total_return(&[100.0, 90.0]) + 0.1).abs() < 1e-12);
        assert_eq!(total_return(&[100.0]), 0.0);
        assert_eq!(total_return(&[]), 0.0);
        assert_eq!(total_return(&[0.0, 10.0]), 0.0);
    }

    // ── Drawdown ──

    #[test]
    fn max_drawdown_tracks_running_peak() {
        let dd = max_drawdown(&[100.0, 120.0, 90.0, 130.0, 117.0]);
        assert!((dd - (-0.25)).abs() < 1e-12);
        assert_eq!(max_drawdown(&[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    // ── Sharpe / Sortino ──

    #[test]
    fn flat_curve_has_zero_ratios() {
        let flat = vec![100.0; 50];
        assert_eq!(sharpe_ratio(&flat, 0.0), 0.0);
        assert_eq!(sortino_ratio(&flat, 0.0), 0.0);
    }

    #[test]
    fn steady_gains_give_high_sharpe_and_no_sortino() {
        let mut curve = vec![100.0];
        for i in 1..253 {
            let r = if i % 2 == 0 { 1.002 } else { 1.0005 };
            curve.push(curve[i - 1] * r);
        }
        assert!(sharpe_ratio(&curve, 0.0) > 5.0);
        // No losing step → downside deviation undefined.
        assert_eq!(sortino_ratio(&curve, 0.0), 0.0);
    }

    #[test]
    fn sortino_is_negative_for_losing_curve() {
        let curve = [100.0, 98.0, 99.0, 95.0, 96.0, 90.0];
        assert!(sortino_ratio(&curve, 0.0) < 0.0);
        assert!(sharpe_ratio(&curve, 0.0) < 0.0);
    }

    // ── Record-level ──

    #[test]
    fn compute_counts_trades_and_exposure() {
        let rec = record(
            &[
                (TradeOutcome::Bought, 1, 100.0),
                (TradeOutcome::RejectedInsufficientCash, 1, 102.0),
                (TradeOutcome::Sold, 0, 101.0),
                (TradeOutcome::RejectedNoShares, 0, 101.0),
            ],
            100.0,
        );
        let m = EpisodeMetrics::compute(&rec);
        assert_eq!(m.steps, 4);
        assert_eq!((m.buys, m.sells, m.rejected), (1, 1, 2));
        assert!((m.exposure - 0.5).abs() < 1e-12);
        assert_eq!(m.final_net_worth, 101.0);
        assert!((m.total_reward - 1.0).abs() < 1e-12);
        assert!((m.total_return - 0.01).abs() < 1e-12);
        assert!(m.max_drawdown < 0.0);
    }

    #[test]
    fn empty_record_is_all_zero() {
        let m = EpisodeMetrics::compute(&record(&[], 50.0));
        assert_eq!(m.steps, 0);
        assert_eq!(m.final_net_worth, 50.0);
        assert_eq!(m.exposure, 0.0);
        assert_eq!(m.total_return, 0.0);
    }

    mod props {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn drawdown_bounded(curve in prop::collection::vec(1.0f64..1_000.0, 1..200)) {
                let dd = max_drawdown(&curve);
                prop_assert!(dd <= 0.0);
                prop_assert!(dd > -1.0);
            }

            #[test]
            fn non_decreasing_curve_has_no_drawdown(
                steps in prop::collection::vec(0.0f64..10.0, 1..100),
            ) {
                let mut curve = vec![100.0];
                for s in steps {
                    let last = curve[curve.len() - 1];
                    curve.push(last + s);
                }
                prop_assert_eq!(max_drawdown(&curve), 0.0);
                prop_assert!(total_return(&curve) >= 0.0);
            }

            #[test]
            fn step_returns_length(curve in prop::collection::vec(1.0f64..1_000.0, 0..100)) {
                prop_assert_eq!(step_returns(&curve).len(), curve.len().saturating_sub(1));
            }
        }
    }
}
