//! Implementation of the `foundry status` command.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::application::LoopRuntime;
use crate::cli::output::{output, truncate, CommandOutput};
use crate::domain::models::{CycleResult, RuntimeStatus};
use crate::services::consensus;

/// Arguments for `foundry status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output directory the loop was started with
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,
}

#[derive(Debug, serde::Serialize)]
struct StatusOutput {
    running: bool,
    runtime: Option<RuntimeStatus>,
    latest_cycle: Option<CycleResult>,
    consensus_valid: bool,
    consensus_errors: Vec<String>,
    company_state: String,
    current_focus: String,
    next_action: String,
}

impl CommandOutput for StatusOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!("{}", console::style("Foundry Status").cyan().bold())];

        match &self.runtime {
            None => lines.push("Runtime: not running (no state file)".to_string()),
            Some(runtime) => {
                lines.push(format!("State: {}", runtime.status));
                lines.push(format!("Cycles: {}", runtime.loop_count));
                lines.push(format!("Errors: {}", runtime.error_count));
                if !runtime.engine.is_empty() {
                    lines.push(format!("Engine: {}", runtime.engine));
                }
                if !runtime.model.is_empty() {
                    lines.push(format!("Model: {}", runtime.model));
                }
                if !runtime.last_run.is_empty() {
                    lines.push(format!("Last run: {}", runtime.last_run));
                }
            }
        }
        lines.push(format!("Process alive: {}", if self.running { "yes" } else { "no" }));

        if let Some(cycle) = &self.latest_cycle {
            lines.push(String::new());
            lines.push(format!("{}", console::style("Latest Cycle").cyan().bold()));
            lines.push(format!("Cycle: {}", cycle.cycle_number));
            lines.push(format!("Status: {}", cycle.status));
            if let Some(cost) = cycle.cost_usd {
                lines.push(format!("Cost: ${cost:.2}"));
            }
            if !cycle.summary.is_empty() {
                lines.push(truncate(&cycle.summary, 200));
            }
        }

        lines.push(String::new());
        lines.push(format!("{}", console::style("Consensus").cyan().bold()));
        if self.consensus_valid {
            if !self.company_state.is_empty() {
                lines.push(truncate(&self.company_state, 300));
            }
            if !self.current_focus.is_empty() {
                lines.push(format!("Focus: {}", truncate(&self.current_focus, 200)));
            }
            if !self.next_action.is_empty() {
                lines.push(format!("Next action: {}", truncate(&self.next_action, 200)));
            }
        } else {
            for error in &self.consensus_errors {
                lines.push(format!("{} {error}", console::style("warning:").yellow()));
            }
        }

        lines.join("\n")
    }
}

/// Show runtime, latest cycle, and consensus status.
pub async fn execute(args: StatusArgs, json_mode: bool) -> Result<()> {
    let runtime = LoopRuntime::new(&args.output);
    let consensus_path = args.output.join("memories").join("consensus.md");

    let (consensus_valid, consensus_errors) = consensus::validate_consensus(&consensus_path);
    let state = consensus::read_consensus(&consensus_path);

    let output_data = StatusOutput {
        running: runtime.is_running(),
        runtime: runtime.status(),
        latest_cycle: runtime.latest_cycle(),
        consensus_valid,
        consensus_errors,
        company_state: state.company_state,
        current_focus: state.current_focus,
        next_action: state.next_action,
    };

    output(&output_data, json_mode);
    Ok(())
}
