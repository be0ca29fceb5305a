//! Company configuration model.
//!
//! All records are immutable value types: every transformation (an applied
//! adjustment, a bootstrap) produces a *new* `FoundryConfig` rather than
//! mutating in place.

use serde::{Deserialize, Serialize};

use super::provider::Provider;

/// Supported AI model tiers, ordered by capability and cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    /// Highest capability, highest cost.
    Opus,
    /// Balanced default tier.
    Sonnet,
    /// Cheapest tier.
    Haiku,
}

impl ModelTier {
    /// The tier's wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Opus => "opus",
            Self::Sonnet => "sonnet",
            Self::Haiku => "haiku",
        }
    }

    /// Resolve a tier from its wire name; `None` for unknown strings.
    ///
    /// Unknown tiers are a skip condition for adjustment application, not
    /// an error.
    pub fn resolve(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "opus" => Some(Self::Opus),
            "sonnet" => Some(Self::Sonnet),
            "haiku" => Some(Self::Haiku),
            _ => None,
        }
    }
}

impl Default for ModelTier {
    fn default() -> Self {
        Self::Sonnet
    }
}

impl std::fmt::Display for ModelTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a persona from the library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaRef {
    /// Persona identifier (library file stem).
    pub id: String,

    /// Free-text instructions layered on top of the library persona.
    #[serde(default)]
    pub custom_instructions: String,
}

impl PersonaRef {
    /// Reference a library persona by id with no custom instructions.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            custom_instructions: String::new(),
        }
    }
}

/// Configuration for a single AI agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Role identifier (e.g. "ceo", "fullstack").
    pub role: String,

    /// Persona backing this agent.
    pub persona: PersonaRef,

    /// Skill tags attached to the agent. No duplicates.
    #[serde(default)]
    pub skills: Vec<String>,

    /// Model tier the agent runs on.
    #[serde(default)]
    pub model: ModelTier,

    /// Coarse role category used for model-tier defaulting.
    #[serde(default = "default_layer")]
    pub layer: String,

    /// Decision areas this agent owns.
    #[serde(default)]
    pub decides: Vec<String>,
}

fn default_layer() -> String {
    "engineering".to_string()
}

/// Configuration for a workflow chain of agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Workflow identifier.
    pub id: String,

    /// Human-readable name.
    pub name: String,

    /// Description of what the workflow accomplishes.
    #[serde(default)]
    pub description: String,

    /// Ordered agent roles the workflow runs through.
    pub chain: Vec<String>,

    /// Number of cycles before the workflow is considered converged.
    /// Always at least 1.
    #[serde(default = "default_convergence_cycles")]
    pub convergence_cycles: u32,
}

const fn default_convergence_cycles() -> u32 {
    3
}

/// Budget limits and alerting thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Hard daily spend ceiling in USD.
    #[serde(default = "default_max_daily_usd")]
    pub max_daily_usd: f64,

    /// Spend level at which alerts begin.
    #[serde(default = "default_alert_at_usd")]
    pub alert_at_usd: f64,
}

const fn default_max_daily_usd() -> f64 {
    50.0
}

const fn default_alert_at_usd() -> f64 {
    30.0
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_daily_usd: default_max_daily_usd(),
            alert_at_usd: default_alert_at_usd(),
        }
    }
}

/// Runtime behavior configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Provider list in declaration order. Never empty when routing.
    #[serde(default = "default_providers")]
    pub providers: Vec<Provider>,

    /// Failover policy name.
    #[serde(default = "default_failover")]
    pub failover: String,

    /// Budget limits.
    #[serde(default)]
    pub budget: BudgetConfig,

    /// Seconds between cycles.
    #[serde(default = "default_loop_interval")]
    pub loop_interval: u32,

    /// Seconds a single cycle may run before it is killed.
    #[serde(default = "default_cycle_timeout")]
    pub cycle_timeout: u32,

    /// Consecutive errors before the loop trips its circuit breaker.
    #[serde(default = "default_max_consecutive_errors")]
    pub max_consecutive_errors: u32,
}

fn default_providers() -> Vec<Provider> {
    vec![Provider::default()]
}

fn default_failover() -> String {
    "auto".to_string()
}

const fn default_loop_interval() -> u32 {
    30
}

const fn default_cycle_timeout() -> u32 {
    1800
}

const fn default_max_consecutive_errors() -> u32 {
    5
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            providers: default_providers(),
            failover: default_failover(),
            budget: BudgetConfig::default(),
            loop_interval: default_loop_interval(),
            cycle_timeout: default_cycle_timeout(),
            max_consecutive_errors: default_max_consecutive_errors(),
        }
    }
}

/// Safety guardrails configuration.
///
/// The built-in dangerous-command patterns already cover filesystem wipes;
/// the forbidden phrase list adds org-specific substring bans on top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardrailConfig {
    /// Case-insensitive forbidden command phrases.
    #[serde(default = "default_forbidden")]
    pub forbidden: Vec<String>,

    /// Directory agents are allowed to write into.
    #[serde(default = "default_workspace")]
    pub workspace: String,

    /// Whether a critic agent must review before shipping.
    #[serde(default = "default_require_critic_review")]
    pub require_critic_review: bool,
}

fn default_forbidden() -> Vec<String> {
    [
        "gh repo delete",
        "wrangler delete",
        "git push --force main",
        "git push --force master",
        "git reset --hard (on main/master)",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_workspace() -> String {
    "projects/".to_string()
}

const fn default_require_critic_review() -> bool {
    true
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self {
            forbidden: default_forbidden(),
            workspace: default_workspace(),
            require_critic_review: default_require_critic_review(),
        }
    }
}

/// Core company identity configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyConfig {
    /// Company name.
    pub name: String,

    /// Mission statement the agents work toward.
    pub mission: String,

    /// Short description of the company.
    #[serde(default)]
    pub description: String,

    /// The seed prompt this company was bootstrapped from.
    #[serde(default)]
    pub seed_prompt: String,
}

/// Organization structure with agents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrgConfig {
    /// Agents in declaration order.
    #[serde(default)]
    pub agents: Vec<AgentConfig>,
}

/// Top-level configuration for a Foundry company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoundryConfig {
    /// Company identity.
    pub company: CompanyConfig,

    /// Organization structure.
    #[serde(default)]
    pub org: OrgConfig,

    /// Workflow chains.
    #[serde(default)]
    pub workflows: Vec<WorkflowConfig>,

    /// Runtime behavior.
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Safety guardrails.
    #[serde(default)]
    pub guardrails: GuardrailConfig,
}
