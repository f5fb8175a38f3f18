//! Reporting and export: JSON report, CSV tapes, Markdown summary.
//!
//! The JSON report carries a `schema_version`; newer versions are rejected
//! on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use neuroquant_core::data::DataSource;

use crate::benchmark::BenchmarkResult;
use crate::episode::EpisodeRecord;
use crate::evaluate::{Evaluation, EvaluationSummary};
use crate::metrics::EpisodeMetrics;
use crate::policy::PolicyKind;

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRow {
    pub index: u64,
    pub seed: u64,
    pub metrics: EpisodeMetrics,
}

/// Persisted summary of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub generated_at: String,
    pub symbol: String,
    pub policy: PolicyKind,
    pub master_seed: u64,
    pub initial_balance: f64,
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub dataset_hash: Option<String>,
    #[serde(default)]
    pub data_source: Option<DataSource>,
    pub summary: EvaluationSummary,
    pub benchmark: BenchmarkResult,
    pub episodes: Vec<EpisodeRow>,
}

impl EvaluationReport {
    pub fn from_evaluation(eval: &Evaluation) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            generated_at: chrono::Local::now().to_rfc3339(),
            symbol: eval.symbol.clone(),
            policy: eval.policy.clone(),
            master_seed: eval.master_seed,
            initial_balance: eval.env_config.initial_balance,
            run_id: None,
            dataset_hash: None,
            data_source: None,
            summary: eval.summary.clone(),
            benchmark: eval.benchmark.clone(),
            episodes: eval
                .outcomes
                .iter()
                .map(|o| EpisodeRow {
                    index: o.index,
                    seed: o.seed,
                    metrics: o.metrics.clone(),
                })
                .collect(),
        }
    }

    pub fn with_provenance(
        mut self,
        run_id: Option<String>,
        dataset_hash: impl Into<String>,
        source: DataSource,
    ) -> Self {
        self.run_id = run_id;
        self.dataset_hash = Some(dataset_hash.into());
        self.data_source = Some(source);
        self
    }

    pub fn is_synthetic(&self) -> bool {
        self.data_source == Some(DataSource::Synthetic)
    }
}

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(report: &EvaluationReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize EvaluationReport to JSON")
}

pub fn import_json(json: &str) -> Result<EvaluationReport> {
    let report: EvaluationReport =
        serde_json::from_str(json).context("failed to deserialize EvaluationReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Step tape. Columns: step, date, action, trade, close, cash, shares,
/// net_worth, reward.
pub fn export_steps_csv(record: &EpisodeRecord) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for step in &record.steps {
        wtr.serialize(step)?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Net-worth curve with step index; row 0 is the initial balance.
pub fn export_net_worth_csv(curve: &[f64]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["step", "net_worth"])?;
    for (i, v) in curve.iter().enumerate() {
        wtr.write_record([i.to_string(), format!("{v:.2}")])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the artifact set for an evaluation.
///
/// Creates `{symbol}_{policy}_{tag}_{timestamp}/` under `output_dir`, where
/// `tag` is the run-id prefix (or `s{seed}` without one). An existing
/// directory is never reused: a numeric suffix is appended instead. The
/// directory holds `report.json`, `report.md`, and, when `best` is given, that
/// episode's `steps.csv` and `net_worth.csv`. Returns the created directory.
pub fn save_artifacts(
    report: &EvaluationReport,
    best: Option<&EpisodeRecord>,
    output_dir: &Path,
) -> Result<PathBuf> {
    let tag = match &report.run_id {
        Some(id) => id.chars().take(8).collect::<String>(),
        None => format!("s{}", report.master_seed),
    };
    let dirname = format!(
        "{}_{}_{}_{}",
        report.symbol,
        report.policy.label(),
        tag,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;
    let run_dir = create_unique_dir(output_dir, &dirname)?;

    std::fs::write(run_dir.join("report.json"), export_json(report)?)?;
    std::fs::write(run_dir.join("report.md"), generate_report(report))?;

    if let Some(record) = best {
        std::fs::write(run_dir.join("steps.csv"), export_steps_csv(record)?)?;
        std::fs::write(
            run_dir.join("net_worth.csv"),
            export_net_worth_csv(&record.net_worth_curve)?,
        )?;
    }

    Ok(run_dir)
}

fn create_unique_dir(parent: &Path, name: &str) -> Result<PathBuf> {
    let mut candidate = parent.join(name);
    let mut n = 1;
    loop {
        match std::fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                n += 1;
                candidate = parent.join(format!("{name}_{n}"));
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to create artifact dir: {}", candidate.display())
                })
            }
        }
    }
}

pub fn load_report(dir: &Path) -> Result<EvaluationReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

// ─── Markdown report ────────────────────────────────────────────────

pub fn generate_report(report: &EvaluationReport) -> String {
    let s = &report.summary;
    let b = &report.benchmark;
    let mut md = String::with_capacity(1024);

    md.push_str("# Evaluation Report\n\n");
    md.push_str("| Field | Value |\n| --- | --- |\n");
    md.push_str(&format!("| Symbol | {} |\n", report.symbol));
    md.push_str(&format!("| Policy | {} |\n", report.policy));
    md.push_str(&format!("| Episodes | {} |\n", s.episodes));
    md.push_str(&format!("| Master Seed | {} |\n", report.master_seed));
    md.push_str(&format!("| Initial Balance | {:.2} |\n", report.initial_balance));
    if let Some(hash) = &report.dataset_hash {
        md.push_str(&format!("| Dataset Hash | {hash} |\n"));
    }
    if report.is_synthetic() {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }

    md.push_str("\n## Results\n\n| Metric | Policy | Buy & Hold |\n| --- | --- | --- |\n");
    md.push_str(&format!(
        "| Final Net Worth | {:.2} (±{:.2}) | {:.2} |\n",
        s.mean_final_net_worth, s.std_final_net_worth, b.final_net_worth
    ));
    md.push_str(&format!(
        "| Total Return | {:.2}% | {:.2}% |\n",
        s.mean_total_return * 100.0,
        b.total_return * 100.0
    ));
    md.push_str(&format!("| Sharpe | {:.3} | |\n", s.mean_sharpe));
    md.push_str(&format!(
        "| Max Drawdown | {:.2}% | |\n",
        s.mean_max_drawdown * 100.0
    ));
    md.push_str(&format!(
        "| Beat Benchmark | {:.0}% of episodes | |\n",
        s.beat_benchmark_rate * 100.0
    ));
    md
}
