//! Implementation of the `foundry evolve` command.
//!
//! Evaluates the recorded cycle logs, summarizes trends, proposes
//! adjustments, and optionally applies them back to the configuration.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::Result;
use clap::Args;
use regex::Regex;
use tracing::debug;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Adjustment, CycleEvaluation, TrendSummary};
use crate::infrastructure::config::ConfigLoader;
use crate::services::{
    apply_adjustments, evaluate_cycle, evolution_report, suggest_adjustments, TrendAnalyzer,
};

static CYCLE_LOG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^cycle-(\d+)\.log$").unwrap());

/// Arguments for `foundry evolve`.
#[derive(Args, Debug)]
pub struct EvolveArgs {
    /// Output directory holding cycle logs and consensus
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// Config file to adjust
    #[arg(short, long, default_value = "company.yaml")]
    pub config: PathBuf,

    /// Trailing window of cycles to analyze
    #[arg(short, long, default_value = "5")]
    pub window: usize,

    /// Apply the suggested adjustments to the config file
    #[arg(short, long)]
    pub apply: bool,
}

#[derive(Debug, serde::Serialize)]
struct EvolveOutput {
    cycles_evaluated: usize,
    trends: TrendSummary,
    adjustments: Vec<Adjustment>,
    applied: bool,
    report: String,
}

impl CommandOutput for EvolveOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![self.report.clone()];
        if self.applied {
            lines.push(format!(
                "{} {} adjustment(s) applied to the configuration",
                console::style("applied:").green().bold(),
                self.adjustments.len()
            ));
        }
        lines.join("\n")
    }
}

/// Evaluate recent cycles and propose (optionally apply) adjustments.
pub async fn execute(args: EvolveArgs, json_mode: bool) -> Result<()> {
    let consensus_path = args.output.join("memories").join("consensus.md");
    let evaluations = evaluate_recorded_cycles(&args.output.join("logs"), &consensus_path);

    let trends = TrendAnalyzer::new(args.window).analyze(&evaluations);
    let adjustments = suggest_adjustments(&evaluations);
    let report = evolution_report(&evaluations, &adjustments);

    let applied = if args.apply && !adjustments.is_empty() {
        let config = ConfigLoader::load_from_file(&args.config)?;
        let updated = apply_adjustments(&config, &adjustments);
        ConfigLoader::save(&updated, &args.config)?;
        true
    } else {
        false
    };

    let output_data = EvolveOutput {
        cycles_evaluated: evaluations.len(),
        trends,
        adjustments,
        applied,
        report,
    };

    output(&output_data, json_mode);
    Ok(())
}

/// Evaluate every recorded cycle log in ascending cycle order.
///
/// Logs that disappear between listing and evaluation are skipped; no
/// historical consensus snapshots exist here, so consensus change is not
/// part of these evaluations.
fn evaluate_recorded_cycles(logs_dir: &Path, consensus_path: &Path) -> Vec<CycleEvaluation> {
    let Ok(entries) = std::fs::read_dir(logs_dir) else {
        return vec![];
    };

    let mut numbered: Vec<(u64, PathBuf)> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name();
            let number: u64 = CYCLE_LOG_RE
                .captures(name.to_str()?)?
                .get(1)?
                .as_str()
                .parse()
                .ok()?;
            Some((number, entry.path()))
        })
        .collect();
    numbered.sort_by_key(|(number, _)| *number);

    numbered
        .into_iter()
        .filter_map(|(number, path)| {
            match evaluate_cycle(&path, consensus_path, None) {
                Ok(evaluation) => Some(evaluation),
                Err(err) => {
                    debug!(cycle = number, error = %err, "Skipping unreadable cycle log");
                    None
                }
            }
        })
        .collect()
}
