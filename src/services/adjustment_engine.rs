//! Rule-driven proposal and application of configuration changes.
//!
//! A pure, order-sensitive policy function: the same evaluation history
//! always yields the same adjustments, and applying adjustments produces a
//! new configuration value rather than mutating the old one.

use crate::domain::models::{
    Adjustment, AdjustmentKind, AgentConfig, CycleEvaluation, FoundryConfig, IssueTag, ModelTier,
    OrgConfig, WorkflowConfig,
};
use crate::services::trend_analyzer::TrendAnalyzer;

/// Consecutive trailing failures that trigger a model upgrade.
const FAILURE_STREAK_THRESHOLD: usize = 3;
/// Evaluations inspected by the cost/progress and skill rules.
const RULE_WINDOW: usize = 5;
/// Mean cost above which the downgrade rule may fire.
const HIGH_COST_THRESHOLD: f64 = 0.5;
/// Mean progress below which the downgrade rule may fire.
const LOW_PROGRESS_THRESHOLD: f64 = 0.3;
/// Trailing cycles without consensus change that trigger a workflow change.
const STAGNATION_STREAK_THRESHOLD: usize = 5;
/// Occurrences of one issue tag that trigger a skill suggestion.
const REPEATED_ISSUE_THRESHOLD: usize = 3;

/// Target sentinel matching every agent.
pub const TARGET_PRIMARY: &str = "primary";

/// Suggest configuration adjustments from evaluation trends.
///
/// Rules fire independently and in a fixed order, so several adjustments
/// may be proposed in one pass:
///
/// 1. Three or more consecutive trailing failures: upgrade the primary
///    model.
/// 2. High mean cost with low mean progress over the last five cycles:
///    downgrade non-critical (business) roles.
/// 3. Five or more trailing cycles without consensus change: restructure
///    the workflow cadence.
/// 4. An issue tag recurring three or more times in the last five cycles:
///    add a targeted skill — at most one skill proposal per pass.
pub fn suggest_adjustments(evaluations: &[CycleEvaluation]) -> Vec<Adjustment> {
    if evaluations.is_empty() {
        return vec![];
    }

    let mut adjustments: Vec<Adjustment> = Vec::new();

    let consecutive_failures = trailing_failures(evaluations);
    if consecutive_failures >= FAILURE_STREAK_THRESHOLD {
        adjustments.push(Adjustment {
            kind: AdjustmentKind::UpgradeModel,
            target: TARGET_PRIMARY.to_string(),
            old_value: "sonnet".to_string(),
            new_value: "opus".to_string(),
            reason: format!(
                "{consecutive_failures} consecutive failures detected. \
                 Upgrading model may improve success rate."
            ),
        });
    }

    let start = evaluations.len().saturating_sub(RULE_WINDOW);
    let recent = &evaluations[start..];

    #[allow(clippy::cast_precision_loss)]
    let avg_cost = recent.iter().map(|e| e.cost_usd).sum::<f64>() / recent.len() as f64;
    #[allow(clippy::cast_precision_loss)]
    let avg_progress = recent.iter().map(|e| e.progress_score).sum::<f64>() / recent.len() as f64;

    if avg_cost > HIGH_COST_THRESHOLD && avg_progress < LOW_PROGRESS_THRESHOLD {
        adjustments.push(Adjustment {
            kind: AdjustmentKind::DowngradeModel,
            target: "business".to_string(),
            old_value: "opus".to_string(),
            new_value: "sonnet".to_string(),
            reason: format!(
                "High avg cost (${avg_cost:.2}) with low progress ({:.1}%). \
                 Downgrade non-critical roles to reduce spend.",
                avg_progress * 100.0
            ),
        });
    }

    let no_change_streak = trailing_no_consensus_change(evaluations);
    if no_change_streak >= STAGNATION_STREAK_THRESHOLD {
        adjustments.push(Adjustment {
            kind: AdjustmentKind::ChangeWorkflow,
            target: "consensus".to_string(),
            old_value: "current".to_string(),
            new_value: "restructured".to_string(),
            reason: format!(
                "No consensus changes for {no_change_streak} cycles. \
                 Consider adding new skills or restructuring the workflow."
            ),
        });
    }

    // Most frequent recurring issue, first-seen on ties; one skill per pass.
    if let Some((issue, count)) = top_issue(recent) {
        if count >= REPEATED_ISSUE_THRESHOLD {
            adjustments.push(Adjustment {
                kind: AdjustmentKind::AddSkill,
                target: issue.as_str().to_string(),
                old_value: "none".to_string(),
                new_value: format!("skill-for-{issue}"),
                reason: format!(
                    "Issue '{issue}' occurred {count} times in recent cycles. \
                     Adding a targeted skill may resolve it."
                ),
            });
        }
    }

    adjustments
}

/// Apply adjustments to a configuration, returning a new immutable value.
///
/// Adjustments fold left-to-right over the agent and workflow lists.
/// Unknown model-tier strings are silently skipped. `add_skill` is
/// idempotent. `change_workflow` bumps every workflow's convergence-cycle
/// count, floored at 1 to guard any future decrementing rule.
pub fn apply_adjustments(config: &FoundryConfig, adjustments: &[Adjustment]) -> FoundryConfig {
    let mut agents = config.org.agents.clone();
    let mut workflows = config.workflows.clone();

    for adjustment in adjustments {
        match adjustment.kind {
            AdjustmentKind::UpgradeModel | AdjustmentKind::DowngradeModel => {
                let Some(tier) = ModelTier::resolve(&adjustment.new_value) else {
                    continue;
                };
                agents = agents
                    .into_iter()
                    .map(|agent| {
                        if agent_matches_target(&agent, &adjustment.target) {
                            AgentConfig { model: tier, ..agent }
                        } else {
                            agent
                        }
                    })
                    .collect();
            }

            AdjustmentKind::AddSkill => {
                agents = agents
                    .into_iter()
                    .map(|agent| {
                        if agent_matches_target(&agent, &adjustment.target) {
                            with_added_skill(agent, &adjustment.new_value)
                        } else {
                            agent
                        }
                    })
                    .collect();
            }

            AdjustmentKind::RemoveAgent => {
                agents.retain(|agent| agent.role != adjustment.target);
            }

            AdjustmentKind::ChangeWorkflow => {
                workflows = workflows
                    .into_iter()
                    .map(|workflow| WorkflowConfig {
                        convergence_cycles: (workflow.convergence_cycles + 1).max(1),
                        ..workflow
                    })
                    .collect();
            }
        }
    }

    FoundryConfig {
        org: OrgConfig { agents },
        workflows,
        ..config.clone()
    }
}

/// Generate a human-readable evolution report in markdown.
pub fn evolution_report(evaluations: &[CycleEvaluation], adjustments: &[Adjustment]) -> String {
    let mut lines: Vec<String> = vec!["# Evolution Report".to_string(), String::new()];

    let trends = TrendAnalyzer::default().analyze(evaluations);
    lines.extend([
        "## Summary".to_string(),
        String::new(),
        format!("- **Cycles evaluated:** {}", evaluations.len()),
        format!("- **Success rate:** {:.1}%", trends.success_rate * 100.0),
        format!("- **Avg cost per cycle:** ${:.4}", trends.avg_cost),
        format!("- **Progress trend:** {}", trends.progress_trend),
        String::new(),
    ]);

    if !trends.repeated_issues.is_empty() {
        lines.extend(["## Recurring Issues".to_string(), String::new()]);
        for (issue, count) in &trends.repeated_issues {
            lines.push(format!("- `{issue}` (x{count})"));
        }
        lines.push(String::new());
    }

    lines.extend(["## Recent Cycles".to_string(), String::new()]);
    let start = evaluations.len().saturating_sub(10);
    for evaluation in &evaluations[start..] {
        let status_icon = if evaluation.success { "OK" } else { "FAIL" };
        let consensus_tag = if evaluation.consensus_changed {
            " [consensus changed]"
        } else {
            ""
        };
        lines.push(format!(
            "- Cycle #{}: {} | cost=${:.4} | progress={:.0}%{}",
            evaluation.cycle_number,
            status_icon,
            evaluation.cost_usd,
            evaluation.progress_score * 100.0,
            consensus_tag
        ));
    }
    lines.push(String::new());

    lines.extend(["## Suggested Adjustments".to_string(), String::new()]);
    if adjustments.is_empty() {
        lines.push("No adjustments suggested at this time.".to_string());
        lines.push(String::new());
    } else {
        for adjustment in adjustments {
            lines.extend([
                format!("### {}: {}", adjustment.kind, adjustment.target),
                String::new(),
                format!("- **Change:** `{}` -> `{}`", adjustment.old_value, adjustment.new_value),
                format!("- **Reason:** {}", adjustment.reason),
                String::new(),
            ]);
        }
    }

    lines.join("\n")
}

/// Consecutive failures counted backward from the most recent evaluation,
/// stopping at the first success.
fn trailing_failures(evaluations: &[CycleEvaluation]) -> usize {
    evaluations.iter().rev().take_while(|e| !e.success).count()
}

/// Consecutive trailing evaluations without a consensus change.
fn trailing_no_consensus_change(evaluations: &[CycleEvaluation]) -> usize {
    evaluations.iter().rev().take_while(|e| !e.consensus_changed).count()
}

/// Most frequent issue tag in the window, first-seen on ties.
fn top_issue(recent: &[CycleEvaluation]) -> Option<(IssueTag, usize)> {
    let mut counts: Vec<(IssueTag, usize)> = Vec::new();
    for evaluation in recent {
        for issue in &evaluation.issues {
            match counts.iter_mut().find(|(tag, _)| tag == issue) {
                Some((_, count)) => *count += 1,
                None => counts.push((*issue, 1)),
            }
        }
    }
    // First-seen wins ties, so only a strictly greater count displaces.
    counts.into_iter().fold(None, |best, candidate| match best {
        Some((_, best_count)) if candidate.1 <= best_count => best,
        _ => Some(candidate),
    })
}

fn agent_matches_target(agent: &AgentConfig, target: &str) -> bool {
    target == TARGET_PRIMARY || agent.role == target || agent.layer == target
}

fn with_added_skill(agent: AgentConfig, skill: &str) -> AgentConfig {
    if agent.skills.iter().any(|s| s == skill) {
        return agent;
    }
    let mut skills = agent.skills.clone();
    skills.push(skill.to_string());
    AgentConfig { skills, ..agent }
}
