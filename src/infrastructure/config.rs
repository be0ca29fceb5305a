//! Configuration loading, saving, and advisory validation.
//!
//! Loading merges the YAML file with `FOUNDRY_`-prefixed environment
//! variables (highest priority). Validation beyond the schema returns
//! warnings rather than errors: a questionable configuration still runs.

use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Yaml};
use figment::Figment;

use crate::domain::models::{BudgetConfig, FoundryConfig, Provider, WorkflowConfig};

/// Configuration loader with environment-variable overrides.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a configuration from a YAML file.
    ///
    /// Environment variables prefixed `FOUNDRY_` override file values,
    /// with `__` separating nesting levels
    /// (e.g. `FOUNDRY_RUNTIME__LOOP_INTERVAL=60`).
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<FoundryConfig> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("FOUNDRY_").split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))
    }

    /// Save a configuration as YAML, creating parent directories.
    pub fn save(config: &FoundryConfig, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let yaml = serde_yaml::to_string(config).context("Failed to serialize config")?;
        std::fs::write(path, yaml)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(())
    }
}

/// Validate a configuration beyond schema rules.
///
/// Returns human-readable warnings; an empty list means no issues found.
pub fn validate_config(config: &FoundryConfig) -> Vec<String> {
    let mut warnings: Vec<String> = Vec::new();

    if config.org.agents.is_empty() {
        warnings.push("No agents defined in org.agents".to_string());
    }

    let agent_roles: Vec<&str> = config.org.agents.iter().map(|a| a.role.as_str()).collect();
    warnings.extend(validate_workflows(&config.workflows, &agent_roles));
    warnings.extend(validate_budget(&config.runtime.budget));
    warnings.extend(validate_providers(&config.runtime.providers));

    warnings
}

/// Check that workflow chains reference known agent roles.
fn validate_workflows(workflows: &[WorkflowConfig], agent_roles: &[&str]) -> Vec<String> {
    let mut warnings: Vec<String> = Vec::new();

    for workflow in workflows {
        for step_role in &workflow.chain {
            if !agent_roles.contains(&step_role.as_str()) {
                warnings.push(format!(
                    "Workflow '{}' references unknown agent role: '{step_role}'",
                    workflow.id
                ));
            }
        }
        if workflow.chain.is_empty() {
            warnings.push(format!("Workflow '{}' has an empty chain", workflow.id));
        }
        if workflow.convergence_cycles < 1 {
            warnings.push(format!(
                "Workflow '{}' has invalid convergence_cycles: {}",
                workflow.id, workflow.convergence_cycles
            ));
        }
    }

    let mut seen: Vec<&str> = Vec::new();
    for workflow in workflows {
        if seen.contains(&workflow.id.as_str()) {
            warnings.push(format!("Duplicate workflow id: '{}'", workflow.id));
        }
        seen.push(&workflow.id);
    }

    warnings
}

fn validate_budget(budget: &BudgetConfig) -> Vec<String> {
    let mut warnings: Vec<String> = Vec::new();

    if budget.alert_at_usd >= budget.max_daily_usd {
        warnings.push(format!(
            "Budget alert threshold (${}) should be below max daily budget (${})",
            budget.alert_at_usd, budget.max_daily_usd
        ));
    }

    if budget.max_daily_usd <= 0.0 {
        warnings.push("Budget max_daily_usd must be positive".to_string());
    }

    warnings
}

fn validate_providers(providers: &[Provider]) -> Vec<String> {
    let mut warnings: Vec<String> = Vec::new();

    if providers.is_empty() {
        warnings.push("No providers configured".to_string());
    }

    for provider in providers {
        if provider.api_key_env.is_empty() && provider.endpoint.is_empty() {
            warnings.push(format!(
                "Provider ({}/{}) has no api_key_env or endpoint configured",
                provider.engine, provider.model
            ));
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{AgentConfig, ModelTier, PersonaRef};
    use std::io::Write;

    const MINIMAL_YAML: &str = "\
company:
  name: Config Co
  mission: Load things
org:
  agents:
    - role: ceo
      persona:
        id: jeff-bezos
      model: opus
      layer: strategy
runtime:
  loop_interval: 45
";

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{MINIMAL_YAML}").unwrap();
        file.flush().unwrap();

        let config = ConfigLoader::load_from_file(file.path()).unwrap();
        assert_eq!(config.company.name, "Config Co");
        assert_eq!(config.runtime.loop_interval, 45);
        assert_eq!(config.org.agents[0].model, ModelTier::Opus);
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ConfigLoader::load_from_file(dir.path().join("gone.yaml")).is_err());
    }

    #[test]
    fn test_env_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{MINIMAL_YAML}").unwrap();
        file.flush().unwrap();

        temp_env::with_var("FOUNDRY_RUNTIME__LOOP_INTERVAL", Some("90"), || {
            let config = ConfigLoader::load_from_file(file.path()).unwrap();
            assert_eq!(config.runtime.loop_interval, 90, "Env override should win");
        });
    }

    #[test]
    fn test_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("company.yaml");

        let config: FoundryConfig = serde_yaml::from_str(MINIMAL_YAML).unwrap();
        ConfigLoader::save(&config, &path).unwrap();

        let reloaded = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config, reloaded);
    }

    #[test]
    fn test_validate_flags_unknown_workflow_role_and_empty_chain() {
        let mut config: FoundryConfig = serde_yaml::from_str(MINIMAL_YAML).unwrap();
        config.workflows = vec![
            WorkflowConfig {
                id: "w1".to_string(),
                name: "W1".to_string(),
                description: String::new(),
                chain: vec!["ghost".to_string()],
                convergence_cycles: 3,
            },
            WorkflowConfig {
                id: "w2".to_string(),
                name: "W2".to_string(),
                description: String::new(),
                chain: vec![],
                convergence_cycles: 3,
            },
        ];

        let warnings = validate_config(&config);
        assert!(warnings.iter().any(|w| w.contains("unknown agent role: 'ghost'")));
        assert!(warnings.iter().any(|w| w.contains("empty chain")));
    }

    #[test]
    fn test_validate_flags_duplicate_workflow_ids() {
        let mut config: FoundryConfig = serde_yaml::from_str(MINIMAL_YAML).unwrap();
        let workflow = WorkflowConfig {
            id: "dup".to_string(),
            name: "Dup".to_string(),
            description: String::new(),
            chain: vec!["ceo".to_string()],
            convergence_cycles: 1,
        };
        config.workflows = vec![workflow.clone(), workflow];

        let warnings = validate_config(&config);
        assert!(warnings.iter().any(|w| w.contains("Duplicate workflow id: 'dup'")));
    }

    #[test]
    fn test_validate_flags_budget_inversion() {
        let mut config: FoundryConfig = serde_yaml::from_str(MINIMAL_YAML).unwrap();
        config.runtime.budget = BudgetConfig {
            max_daily_usd: 10.0,
            alert_at_usd: 20.0,
        };

        let warnings = validate_config(&config);
        assert!(warnings.iter().any(|w| w.contains("alert threshold")));
    }

    #[test]
    fn test_validate_flags_credentialless_provider() {
        let config: FoundryConfig = serde_yaml::from_str(MINIMAL_YAML).unwrap();
        // The default provider has neither api_key_env nor endpoint.
        let warnings = validate_config(&config);
        assert!(warnings.iter().any(|w| w.contains("no api_key_env or endpoint")));
    }

    #[test]
    fn test_validate_no_agents_warning() {
        let config: FoundryConfig =
            serde_yaml::from_str("company:\n  name: X\n  mission: Y\n").unwrap();
        let warnings = validate_config(&config);
        assert!(warnings.iter().any(|w| w.contains("No agents defined")));
    }

    #[test]
    fn test_clean_config_has_no_warnings() {
        let mut config: FoundryConfig = serde_yaml::from_str(MINIMAL_YAML).unwrap();
        config.runtime.providers[0].api_key_env = "ANTHROPIC_API_KEY".to_string();
        config.org.agents.push(AgentConfig {
            role: "fullstack".to_string(),
            persona: PersonaRef::new("dhh"),
            skills: vec![],
            model: ModelTier::Sonnet,
            layer: "engineering".to_string(),
            decides: vec![],
        });

        assert!(validate_config(&config).is_empty());
    }
}
