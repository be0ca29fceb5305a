//! Service layer: business logic over the domain models.

pub mod adjustment_engine;
pub mod bootstrap;
pub mod consensus;
pub mod cycle_evaluator;
pub mod guardrails;
pub mod provider_router;
pub mod trend_analyzer;

pub use adjustment_engine::{apply_adjustments, evolution_report, suggest_adjustments};
pub use consensus::{backup_consensus, read_consensus, restore_consensus, validate_consensus};
pub use cycle_evaluator::evaluate_cycle;
pub use guardrails::GuardrailValidator;
pub use provider_router::{ProviderRouter, RouteDecision, RoutingTable};
pub use trend_analyzer::TrendAnalyzer;
