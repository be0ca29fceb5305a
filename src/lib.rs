//! Foundry - Self-Bootstrapping AI Company Supervisor
//!
//! Foundry turns a seed prompt into an AI company configuration,
//! generates the runtime artifacts, supervises an unattended cycle loop
//! driven by an external AI-engine CLI, evaluates each cycle's outcome,
//! and adapts the configuration from observed trends.
//!
//! # Architecture
//!
//! The crate is layered:
//!
//! - **Domain Layer** (`domain`): immutable value types and errors
//! - **Service Layer** (`services`): routing, evaluation, trends,
//!   adjustments, guardrails, consensus, bootstrap
//! - **Application Layer** (`application`): process lifecycle supervision
//! - **Infrastructure Layer** (`infrastructure`): config I/O and artifact
//!   generation
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use foundry::application::LoopRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = LoopRuntime::new("output");
//!     println!("running: {}", runtime.is_running());
//!     Ok(())
//! }
//! ```

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::LoopRuntime;
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    Adjustment, AdjustmentKind, AgentConfig, ConsensusState, CycleEvaluation, CycleResult,
    CycleStatus, Engine, FoundryConfig, IssueTag, LoopStatus, ModelTier, ProgressTrend, Provider,
    RuntimeStatus, TrendSummary, WorkflowConfig,
};
pub use infrastructure::config::ConfigLoader;
pub use services::{GuardrailValidator, ProviderRouter, RouteDecision, TrendAnalyzer};
