//! Implementation of the `foundry up` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::application::LoopRuntime;
use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::config::{validate_config, ConfigLoader};
use crate::infrastructure::generator;
use crate::services::GuardrailValidator;

/// Arguments for `foundry up`.
#[derive(Args, Debug)]
pub struct UpArgs {
    /// Config file path
    #[arg(short, long, default_value = "company.yaml")]
    pub config: PathBuf,

    /// Output directory for generated files and loop state
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// Detach the loop into the background instead of running in the
    /// foreground
    #[arg(short, long)]
    pub daemon: bool,
}

#[derive(Debug, serde::Serialize)]
struct UpOutput {
    company: String,
    files_generated: usize,
    warnings: Vec<String>,
    audit_issues: Vec<String>,
    pid: u32,
    daemon: bool,
}

impl CommandOutput for UpOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("{} {}", console::style("Starting").cyan().bold(), self.company),
            format!("Generated {} files", self.files_generated),
        ];

        for warning in &self.warnings {
            lines.push(format!("{} {warning}", console::style("warning:").yellow()));
        }
        for issue in &self.audit_issues {
            lines.push(format!("{} {issue}", console::style("audit:").yellow()));
        }

        let mode = if self.daemon { "background" } else { "foreground" };
        lines.push(format!("Auto-loop started in {mode} (PID: {})", self.pid));
        lines.join("\n")
    }
}

/// Generate artifacts and start the autonomous loop.
pub async fn execute(args: UpArgs, json_mode: bool) -> Result<()> {
    let config = ConfigLoader::load_from_file(&args.config)?;

    let mut warnings = validate_config(&config);
    let validator = GuardrailValidator::new();
    warnings.extend(validator.validate_config(&config));

    let report = generator::generate_all(&config, &args.output)
        .context("Failed to generate runtime artifacts")?;
    let audit_issues = validator.audit_generated_files(&args.output);

    let runtime = LoopRuntime::new(&args.output);
    let pid = runtime.start(&config, !args.daemon).await?;

    let output_data = UpOutput {
        company: config.company.name,
        files_generated: report.files_created.len(),
        warnings,
        audit_issues,
        pid,
        daemon: args.daemon,
    };

    output(&output_data, json_mode);
    Ok(())
}
