//! NeuroQuant CLI: prepare series, run single episodes, and evaluate policies.
//!
//! Commands:
//! - `prepare`: fetch raw bars, enrich with indicators, write `{SYMBOL}_processed.csv`
//! - `simulate`: run one episode on a processed series and print the final net worth
//! - `evaluate`: multi-episode evaluation against buy-and-hold, with saved artifacts

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use neuroquant_core::data::{read_series_csv, series_hash, symbol_from_path, DataSource};
use neuroquant_core::domain::MarketSeries;
use neuroquant_core::env::{EnvConfig, TradingEnv, DEFAULT_INITIAL_BALANCE};
use neuroquant_runner::{
    build_policy, evaluate, load_series, provider_for, run_episode, save_artifacts, DataSection,
    EpisodeMetrics, Evaluation, EvaluationReport, EvaluationSection, LoadOptions, PolicyKind,
    RunConfig, RunOverrides, SourceConfig,
};

#[derive(Parser)]
#[command(
    name = "neuroquant",
    about = "NeuroQuant CLI: single-asset trading environment and policy evaluation"
)]
struct Cli {
    /// Log filter (e.g. warn, info, neuroquant_core=debug). RUST_LOG overrides.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch raw bars, compute indicators, and write the processed series CSV.
    Prepare {
        /// Ticker symbol (e.g., AAPL).
        symbol: String,

        /// Start date (YYYY-MM-DD). Defaults to 5 years ago.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Read raw bars from a local CSV instead of Yahoo Finance.
        #[arg(long, conflicts_with = "synthetic")]
        csv: Option<PathBuf>,

        /// Generate synthetic bars (offline development only).
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Seed for synthetic bars.
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Output directory for processed series.
        #[arg(long, default_value = "data/processed")]
        out_dir: PathBuf,

        /// Rebuild even if the processed file already exists.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Run a single episode on a processed series.
    Simulate {
        /// Path to a processed series CSV.
        #[arg(long)]
        series: PathBuf,

        #[arg(long, default_value_t = DEFAULT_INITIAL_BALANCE)]
        initial_balance: f64,

        /// Policy: random, hold, buy_and_hold, rsi_threshold[:LOW:HIGH], scripted:A,B,...
        #[arg(long, default_value = "random")]
        policy: PolicyKind,

        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Evaluate a policy over many episodes and compare with buy-and-hold.
    Evaluate {
        /// Path to a TOML run config.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Path to a processed series CSV (alternative to --config).
        #[arg(long)]
        series: Option<PathBuf>,

        /// Overrides the config's policy.
        #[arg(long)]
        policy: Option<PolicyKind>,

        /// Overrides the config's episode count.
        #[arg(long)]
        episodes: Option<usize>,

        /// Overrides the config's master seed.
        #[arg(long)]
        seed: Option<u64>,

        /// Overrides the config's starting balance.
        #[arg(long)]
        initial_balance: Option<f64>,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Commands::Prepare {
            symbol,
            start,
            end,
            csv,
            synthetic,
            seed,
            out_dir,
            force,
        } => run_prepare(symbol, start, end, csv, synthetic, seed, out_dir, force),
        Commands::Simulate {
            series,
            initial_balance,
            policy,
            seed,
        } => run_simulate(series, initial_balance, policy, seed),
        Commands::Evaluate {
            config,
            series,
            policy,
            episodes,
            seed,
            initial_balance,
            output_dir,
        } => run_evaluate(
            config,
            series,
            policy,
            episodes,
            seed,
            initial_balance,
            output_dir,
        ),
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn parse_date(raw: Option<&str>, fallback: NaiveDate) -> Result<NaiveDate> {
    raw.map(|s| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}'"))
    })
    .transpose()
    .map(|d| d.unwrap_or(fallback))
}

#[allow(clippy::too_many_arguments)]
fn run_prepare(
    symbol: String,
    start: Option<String>,
    end: Option<String>,
    csv: Option<PathBuf>,
    synthetic: bool,
    seed: u64,
    out_dir: PathBuf,
    force: bool,
) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let start = parse_date(start.as_deref(), today - chrono::Duration::days(365 * 5))?;
    let end = parse_date(end.as_deref(), today)?;
    if start >= end {
        bail!("--start ({start}) must be before --end ({end})");
    }

    let source = match (csv, synthetic) {
        (Some(path), _) => SourceConfig::Csv { path },
        (None, true) => SourceConfig::Synthetic { seed },
        (None, false) => SourceConfig::Yahoo,
    };
    let data = DataSection {
        symbol: symbol.to_uppercase(),
        start,
        end,
        processed_dir: out_dir,
        source,
    };

    let config = RunConfig {
        data,
        indicators: Default::default(),
        environment: Default::default(),
        evaluation: Default::default(),
    };
    config.validate()?;

    let provider = provider_for(&config.data.source)?;
    let opts = LoadOptions {
        force,
        synthetic_fallback: false,
    };
    let loaded = load_series(&config.data, &config.indicators, provider.as_ref(), &opts)?;

    let series = &loaded.series;
    println!("Symbol:   {}", series.symbol());
    println!("Source:   {:?}", loaded.source);
    println!("Shape:    ({}, 7)", series.len());
    println!("Period:   {} to {}", series.first().date, series.last().date);
    println!("Hash:     {}", loaded.dataset_hash);
    println!("Saved to: {}", loaded.path.display());
    if loaded.is_synthetic() {
        println!("WARNING: series is SYNTHETIC");
    }
    Ok(())
}

fn load_processed(path: &Path) -> Result<MarketSeries> {
    let symbol = symbol_from_path(path);
    read_series_csv(&symbol, path)
        .with_context(|| format!("failed to load processed series {}", path.display()))
}

fn run_simulate(path: PathBuf, initial_balance: f64, policy: PolicyKind, seed: u64) -> Result<()> {
    let series = load_processed(&path)?;
    let mut env = TradingEnv::new(series, EnvConfig::new(initial_balance))?;
    let mut agent = build_policy(&policy, seed);
    let record = run_episode(&mut env, agent.as_mut())?;
    let metrics = EpisodeMetrics::compute(&record);

    info!(symbol = %record.symbol, policy = %policy, seed, "simulation finished");
    println!("Symbol:          {}", record.symbol);
    println!("Policy:          {policy}");
    println!("Steps:           {}", metrics.steps);
    println!(
        "Trades:          {} buys, {} sells, {} rejected",
        metrics.buys, metrics.sells, metrics.rejected
    );
    println!("Total Return:    {:.2}%", metrics.total_return * 100.0);
    println!("Final net worth: {:.2}", metrics.final_net_worth);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_evaluate(
    config_path: Option<PathBuf>,
    series_path: Option<PathBuf>,
    policy: Option<PolicyKind>,
    episodes: Option<usize>,
    seed: Option<u64>,
    initial_balance: Option<f64>,
    output_dir: PathBuf,
) -> Result<()> {
    if config_path.is_some() && series_path.is_some() {
        bail!("--config and --series are mutually exclusive");
    }

    let overrides = RunOverrides {
        policy,
        episodes,
        seed,
        initial_balance,
    };

    let (series, env_config, evaluation, run_id, dataset_hash, source) =
        match (config_path, series_path) {
            (Some(path), None) => {
                let config = RunConfig::from_file(&path)?.with_overrides(&overrides)?;
                let provider = provider_for(&config.data.source)?;
                let loaded = load_series(
                    &config.data,
                    &config.indicators,
                    provider.as_ref(),
                    &LoadOptions::default(),
                )?;
                let run_id = config.run_id();
                (
                    loaded.series,
                    config.environment,
                    config.evaluation,
                    Some(run_id),
                    loaded.dataset_hash,
                    loaded.source,
                )
            }
            (None, Some(path)) => {
                let series = load_processed(&path)?;
                let hash = series_hash(&series);
                let mut env_config = EnvConfig::default();
                let mut evaluation = EvaluationSection::default();
                overrides.apply(&mut env_config, &mut evaluation);
                (
                    series,
                    env_config,
                    evaluation,
                    None,
                    hash,
                    DataSource::Processed,
                )
            }
            _ => bail!("one of --config or --series is required"),
        };

    let eval = evaluate(
        Arc::new(series),
        env_config,
        &evaluation.policy,
        evaluation.episodes,
        evaluation.seed,
    )?;
    print_summary(&eval);

    let report =
        EvaluationReport::from_evaluation(&eval).with_provenance(run_id, dataset_hash, source);
    let best = eval.best_episode().map(|o| &o.record);
    let run_dir = save_artifacts(&report, best, &output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());
    Ok(())
}

fn print_summary(eval: &Evaluation) {
    let s = &eval.summary;
    let b = &eval.benchmark;
    println!();
    println!("=== Evaluation Result ===");
    println!("Symbol:          {}", eval.symbol);
    println!("Policy:          {}", eval.policy);
    println!("Episodes:        {}", s.episodes);
    println!("Master Seed:     {}", eval.master_seed);
    println!();
    println!("--- Policy ---");
    println!(
        "Final Net Worth: {:.2} ± {:.2} (min {:.2}, max {:.2})",
        s.mean_final_net_worth, s.std_final_net_worth, s.min_final_net_worth, s.max_final_net_worth
    );
    println!("Total Return:    {:.2}%", s.mean_total_return * 100.0);
    println!("Sharpe:          {:.3}", s.mean_sharpe);
    println!("Max Drawdown:    {:.2}%", s.mean_max_drawdown * 100.0);
    println!();
    println!("--- Buy & Hold ---");
    println!(
        "Shares:          {} @ {:.2} → {:.2}",
        b.shares, b.initial_price, b.final_price
    );
    println!("Final Net Worth: {:.2}", b.final_net_worth);
    println!("Total Return:    {:.2}%", b.total_return * 100.0);
    println!();
    println!(
        "Beat benchmark in {:.0}% of episodes",
        s.beat_benchmark_rate * 100.0
    );
}
