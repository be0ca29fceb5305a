//! Evaluation records derived from cycle outcomes, and the adjustments
//! proposed from them.

use serde::{Deserialize, Serialize};

/// Categorized issue observed in a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueTag {
    /// The cycle (or an operation inside it) timed out.
    Timeout,
    /// The provider rate-limited the cycle.
    RateLimit,
    /// Authentication or permission failure.
    AuthError,
    /// Failure with no recognizable signature.
    GeneralFailure,
}

impl IssueTag {
    /// The tag's wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::RateLimit => "rate_limit",
            Self::AuthError => "auth_error",
            Self::GeneralFailure => "general_failure",
        }
    }
}

impl std::fmt::Display for IssueTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable evaluation of a single cycle.
///
/// `progress_score` is always within `[0, 1]`. A missing cost evaluates to
/// `0.0` here (unlike `CycleResult`, which keeps it absent) so trend math
/// can exclude free cycles from average-cost computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleEvaluation {
    /// Cycle sequence number.
    pub cycle_number: u32,

    /// Whether the cycle reported `ok`.
    pub success: bool,

    /// Reported cost in USD, zero when the log carried none.
    pub cost_usd: f64,

    /// Whether the consensus document changed during the cycle.
    pub consensus_changed: bool,

    /// Heuristic 0–1 measure of forward motion.
    pub progress_score: f64,

    /// Issues observed, in extraction order, without duplicates.
    pub issues: Vec<IssueTag>,
}

/// Direction of the progress-score trend over a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressTrend {
    /// Second half of the window scored meaningfully higher.
    Improving,
    /// No meaningful movement either way.
    Stagnant,
    /// Second half of the window scored meaningfully lower.
    Declining,
}

impl ProgressTrend {
    /// The trend's wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Improving => "improving",
            Self::Stagnant => "stagnant",
            Self::Declining => "declining",
        }
    }
}

impl std::fmt::Display for ProgressTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregated signals over a trailing window of evaluations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    /// Fraction of cycles in the window that succeeded.
    pub success_rate: f64,

    /// Mean of strictly positive costs in the window; zero when none.
    pub avg_cost: f64,

    /// Direction of the progress-score trend.
    pub progress_trend: ProgressTrend,

    /// Issue tags occurring more than once, by descending count
    /// (ties keep first-seen order).
    pub repeated_issues: Vec<(IssueTag, usize)>,
}

/// Kind of configuration change an adjustment performs.
///
/// The kind fully determines which configuration fields the adjustment may
/// touch when applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    /// Move matching agents to a more capable model tier.
    UpgradeModel,
    /// Move matching agents to a cheaper model tier.
    DowngradeModel,
    /// Attach a skill tag to matching agents.
    AddSkill,
    /// Drop agents whose role matches the target.
    RemoveAgent,
    /// Restructure workflow cadence.
    ChangeWorkflow,
}

impl AdjustmentKind {
    /// The kind's wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UpgradeModel => "upgrade_model",
            Self::DowngradeModel => "downgrade_model",
            Self::AddSkill => "add_skill",
            Self::RemoveAgent => "remove_agent",
            Self::ChangeWorkflow => "change_workflow",
        }
    }
}

impl std::fmt::Display for AdjustmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable suggested adjustment to the company configuration.
///
/// `target` is a role identifier, a layer identifier, a skill tag, or the
/// sentinel `primary` meaning "match every agent". Constructed and
/// consumed within a single pass; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    /// What kind of change to perform.
    pub kind: AdjustmentKind,

    /// Role, layer, skill tag, or `primary`.
    pub target: String,

    /// Value being replaced, for the audit trail.
    pub old_value: String,

    /// Replacement value.
    pub new_value: String,

    /// Human-readable justification.
    pub reason: String,
}
