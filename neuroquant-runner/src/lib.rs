//! NeuroQuant Runner: policies, episodes, evaluation, metrics, artifacts.
//!
//! This crate builds on `neuroquant-core` to provide:
//! - The `Policy` boundary plus rule-based baseline policies
//! - Single-episode driver producing a step tape and net-worth curve
//! - Parallel, seed-deterministic multi-episode evaluation
//! - Episode metrics and the buy-and-hold benchmark
//! - TOML run configuration and processed-series resolution
//! - JSON / CSV / Markdown artifact export

pub mod benchmark;
pub mod config;
pub mod data_loader;
pub mod episode;
pub mod evaluate;
pub mod export;
pub mod metrics;
pub mod policy;

pub use benchmark::{buy_and_hold_benchmark, BenchmarkResult};
pub use config::{
    ConfigError, DataSection, EvaluationSection, RunConfig, RunId, RunOverrides, SourceConfig,
};
pub use data_loader::{load_series, provider_for, LoadError, LoadOptions, LoadedSeries};
pub use episode::{run_episode, EpisodeRecord, StepRecord};
pub use evaluate::{evaluate, EpisodeOutcome, Evaluation, EvaluationSummary, RunError};
pub use export::{
    export_json, export_net_worth_csv, export_steps_csv, generate_report, import_json,
    load_report, save_artifacts, EpisodeRow, EvaluationReport, SCHEMA_VERSION,
};
pub use metrics::EpisodeMetrics;
pub use policy::{
    build_policy, BuyAndHoldPolicy, EpisodeContext, HoldPolicy, Policy, PolicyKind, RandomPolicy,
    RsiThresholdPolicy, ScriptedPolicy,
};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn results_are_send_sync() {
        assert_send::<EpisodeRecord>();
        assert_sync::<EpisodeRecord>();
        assert_send::<EpisodeMetrics>();
        assert_sync::<EpisodeMetrics>();
        assert_send::<EpisodeOutcome>();
        assert_sync::<EpisodeOutcome>();
        assert_send::<EvaluationReport>();
        assert_sync::<EvaluationReport>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
        assert_send::<PolicyKind>();
        assert_sync::<PolicyKind>();
    }

    #[test]
    fn boxed_policies_can_cross_threads() {
        assert_send::<Box<dyn Policy>>();
        assert_send::<RandomPolicy>();
        assert_send::<ScriptedPolicy>();
    }
}
