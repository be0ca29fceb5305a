//! Implementation of the `foundry init` command.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Table};

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::SeedAnalysis;
use crate::infrastructure::config::{validate_config, ConfigLoader};
use crate::services::bootstrap;

/// Arguments for `foundry init`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Seed prompt describing what the company should build
    pub seed_prompt: String,

    /// Output directory for the configuration
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Config filename
    #[arg(short, long, default_value = "company.yaml")]
    pub config: String,

    /// Persona/skill/workflow library directory
    #[arg(short, long, default_value = "library")]
    pub library: PathBuf,
}

#[derive(Debug, serde::Serialize)]
struct AgentSummary {
    role: String,
    persona: String,
    layer: String,
    model: String,
}

#[derive(Debug, serde::Serialize)]
struct InitOutput {
    company: String,
    analysis: SeedAnalysis,
    agents: Vec<AgentSummary>,
    workflows: Vec<String>,
    config_path: PathBuf,
    warnings: Vec<String>,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("{}", console::style(&self.company).cyan().bold()),
            format!(
                "Domain: {} | Audience: {} | Complexity: {}",
                self.analysis.domain, self.analysis.target_audience, self.analysis.complexity
            ),
            String::new(),
        ];

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(["Role", "Persona", "Layer", "Model"]);
        for agent in &self.agents {
            table.add_row([&agent.role, &agent.persona, &agent.layer, &agent.model]);
        }
        lines.push(table.to_string());

        if !self.workflows.is_empty() {
            lines.push(String::new());
            lines.push(format!("Workflows: {}", self.workflows.join(", ")));
        }

        lines.push(String::new());
        lines.push(format!("Config saved to {}", self.config_path.display()));

        for warning in &self.warnings {
            lines.push(format!("{} {warning}", console::style("warning:").yellow()));
        }

        lines.push(String::new());
        lines.push(format!(
            "Next: run {} to generate files and start the loop.",
            console::style("foundry up").bold()
        ));

        lines.join("\n")
    }
}

/// Bootstrap a configuration from the seed prompt and save it.
pub async fn execute(args: InitArgs, json_mode: bool) -> Result<()> {
    let analysis = bootstrap::analyze_seed(&args.seed_prompt);
    let config = bootstrap::generate_config(&args.seed_prompt, &args.library);

    let config_path = args.output.join(&args.config);
    ConfigLoader::save(&config, &config_path)?;

    let output_data = InitOutput {
        company: config.company.name.clone(),
        agents: config
            .org
            .agents
            .iter()
            .map(|a| AgentSummary {
                role: a.role.clone(),
                persona: a.persona.id.clone(),
                layer: a.layer.clone(),
                model: a.model.to_string(),
            })
            .collect(),
        workflows: config.workflows.iter().map(|w| w.name.clone()).collect(),
        warnings: validate_config(&config),
        analysis,
        config_path,
    };

    output(&output_data, json_mode);
    Ok(())
}
