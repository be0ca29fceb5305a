//! Layer-aware provider routing with deterministic failover.
//!
//! Maps a role's layer category to a model tier, selects the best
//! configured provider for that tier, and fails over to the next healthy
//! provider when one goes bad. Opus for strategy and intelligence work,
//! Sonnet everywhere else.

use std::env;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ModelTier, Provider};

/// Layer-to-tier routing table.
///
/// Modeled as data rather than a branching chain so the policy stays
/// auditable and testable in isolation.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    entries: Vec<(String, ModelTier)>,
    fallback: ModelTier,
}

impl RoutingTable {
    /// Build a table from explicit entries and a fallback tier.
    pub fn new(entries: Vec<(String, ModelTier)>, fallback: ModelTier) -> Self {
        Self { entries, fallback }
    }

    /// Tier for a layer, or the fallback for unknown layers.
    pub fn tier_for(&self, layer: &str) -> ModelTier {
        self.entries
            .iter()
            .find(|(name, _)| name == layer)
            .map_or(self.fallback, |(_, tier)| *tier)
    }
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::new(
            vec![
                ("strategy".to_string(), ModelTier::Opus),
                ("product".to_string(), ModelTier::Sonnet),
                ("engineering".to_string(), ModelTier::Sonnet),
                ("business".to_string(), ModelTier::Sonnet),
                ("intelligence".to_string(), ModelTier::Opus),
            ],
            ModelTier::Sonnet,
        )
    }
}

/// Immutable routing decision with reasoning.
///
/// Produced per call, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDecision {
    /// The chosen provider.
    pub provider: Provider,

    /// Human-readable justification. Records explicitly when the decision
    /// was a fallback off the optimal tier.
    pub reason: String,
}

/// Provider router for layer-aware selection and failover.
#[derive(Debug, Clone, Default)]
pub struct ProviderRouter {
    table: RoutingTable,
}

impl ProviderRouter {
    /// Create a router with a custom routing table.
    pub fn new(table: RoutingTable) -> Self {
        Self { table }
    }

    /// Create a router with the default layer-to-tier table.
    pub fn with_defaults() -> Self {
        Self::new(RoutingTable::default())
    }

    /// Recommended model tier for a role layer.
    ///
    /// Unknown layers fall back to Sonnet.
    pub fn optimal_model(&self, layer: &str) -> ModelTier {
        self.table.tier_for(layer)
    }

    /// Select the best provider for a role layer.
    ///
    /// Providers matching the layer's optimal tier are preferred; among
    /// matches the highest priority wins, first-encountered on ties. When
    /// no provider matches the tier, the highest-priority provider overall
    /// is chosen and the reason records the fallback.
    pub fn select_provider(&self, layer: &str, providers: &[Provider]) -> DomainResult<RouteDecision> {
        if providers.is_empty() {
            return Err(DomainError::NoProviders);
        }

        let optimal = self.optimal_model(layer);

        let matching: Vec<&Provider> = providers
            .iter()
            .filter(|p| p.model == optimal.as_str())
            .collect();

        if let Some(best) = highest_priority(&matching) {
            return Ok(RouteDecision {
                provider: (*best).clone(),
                reason: format!(
                    "Selected {}/{} for '{}' layer (optimal tier match, priority={})",
                    best.engine, best.model, layer, best.priority
                ),
            });
        }

        let all: Vec<&Provider> = providers.iter().collect();
        let Some(best) = highest_priority(&all) else {
            return Err(DomainError::NoProviders);
        };
        Ok(RouteDecision {
            provider: (*best).clone(),
            reason: format!(
                "Fallback to {}/{} for '{}' layer (no {} provider available, priority={})",
                best.engine, best.model, layer, optimal, best.priority
            ),
        })
    }

    /// Check whether a provider is usable right now.
    ///
    /// True only if the engine CLI resolves on `PATH` and, when the
    /// provider names an API key variable, that variable is set and
    /// non-empty. Both conditions are necessary.
    pub fn check_health(&self, provider: &Provider) -> bool {
        if !executable_on_path(provider.engine.as_str()) {
            return false;
        }

        if !provider.api_key_env.is_empty() {
            match env::var(&provider.api_key_env) {
                Ok(value) if !value.is_empty() => {}
                _ => return false,
            }
        }

        true
    }

    /// Find the next healthy provider after a failure.
    ///
    /// Candidates are every provider other than `current` (by value
    /// equality), tried in descending priority order. Returns `None` when
    /// no healthy alternative exists.
    pub fn failover(&self, current: &Provider, providers: &[Provider]) -> Option<Provider> {
        let mut candidates: Vec<&Provider> = providers.iter().filter(|p| *p != current).collect();
        // Stable sort keeps declaration order among equal priorities.
        candidates.sort_by(|a, b| b.priority.cmp(&a.priority));

        candidates
            .into_iter()
            .find(|candidate| self.check_health(candidate))
            .cloned()
    }
}

/// Highest-priority provider, first-encountered on ties.
fn highest_priority<'a>(providers: &[&'a Provider]) -> Option<&'a Provider> {
    providers
        .iter()
        .copied()
        .fold(None, |best: Option<&Provider>, candidate| match best {
            Some(current) if candidate.priority <= current.priority => Some(current),
            _ => Some(candidate),
        })
}

/// Whether `name` resolves to an executable file on the current `PATH`.
fn executable_on_path(name: &str) -> bool {
    let Some(path_var) = env::var_os("PATH") else {
        return false;
    };

    env::split_paths(&path_var).any(|dir| is_executable(&dir.join(name)))
}

fn is_executable(path: &Path) -> bool {
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}
