//! Domain models: pure, immutable value types.

pub mod config;
pub mod consensus;
pub mod cycle;
pub mod evaluation;
pub mod provider;
pub mod runtime;
pub mod seed;

pub use config::{
    AgentConfig, BudgetConfig, CompanyConfig, FoundryConfig, GuardrailConfig, ModelTier,
    OrgConfig, PersonaRef, RuntimeConfig, WorkflowConfig,
};
pub use consensus::ConsensusState;
pub use cycle::{CycleResult, CycleStatus, RawCycleLog};
pub use evaluation::{
    Adjustment, AdjustmentKind, CycleEvaluation, IssueTag, ProgressTrend, TrendSummary,
};
pub use provider::{Engine, Provider};
pub use runtime::{LoopStatus, RuntimeStatus};
pub use seed::{Complexity, SeedAnalysis};
