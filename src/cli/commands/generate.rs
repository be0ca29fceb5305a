//! Implementation of the `foundry generate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::config::{validate_config, ConfigLoader};
use crate::infrastructure::generator;
use crate::services::GuardrailValidator;

/// Arguments for `foundry generate`.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Config file path
    #[arg(short, long, default_value = "company.yaml")]
    pub config: PathBuf,

    /// Output directory for generated files
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,
}

#[derive(Debug, serde::Serialize)]
struct GenerateOutput {
    company: String,
    files_created: Vec<PathBuf>,
    agent_count: usize,
    skill_count: usize,
    workflow_count: usize,
    warnings: Vec<String>,
    audit_issues: Vec<String>,
}

impl CommandOutput for GenerateOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("{} {}", console::style("Generated").green().bold(), self.company),
            format!(
                "{} files | {} agents | {} skills | {} workflows",
                self.files_created.len(),
                self.agent_count,
                self.skill_count,
                self.workflow_count
            ),
        ];

        for warning in &self.warnings {
            lines.push(format!("{} {warning}", console::style("warning:").yellow()));
        }

        if self.audit_issues.is_empty() {
            lines.push("Security audit passed: no issues found".to_string());
        } else {
            for issue in &self.audit_issues {
                lines.push(format!("{} {issue}", console::style("audit:").yellow()));
            }
        }

        lines.join("\n")
    }
}

/// Generate runtime artifacts without starting the loop.
pub async fn execute(args: GenerateArgs, json_mode: bool) -> Result<()> {
    let config = ConfigLoader::load_from_file(&args.config)?;

    let mut warnings = validate_config(&config);
    let validator = GuardrailValidator::new();
    warnings.extend(validator.validate_config(&config));

    let report = generator::generate_all(&config, &args.output)
        .context("Failed to generate runtime artifacts")?;
    let audit_issues = validator.audit_generated_files(&args.output);

    let output_data = GenerateOutput {
        company: config.company.name,
        files_created: report.files_created,
        agent_count: report.agent_count,
        skill_count: report.skill_count,
        workflow_count: report.workflow_count,
        warnings,
        audit_issues,
    };

    output(&output_data, json_mode);
    Ok(())
}
