//! Turns one raw cycle log plus a consensus diff into a normalized
//! evaluation record.

use std::fs;
use std::path::Path;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{CycleEvaluation, CycleStatus, IssueTag, RawCycleLog};

/// Progress awarded for a successful cycle.
const SUCCESS_WEIGHT: f64 = 0.5;
/// Progress awarded when the consensus document changed.
const CONSENSUS_WEIGHT: f64 = 0.3;
/// Progress awarded for a substantive summary.
const SUMMARY_WEIGHT: f64 = 0.2;
/// Trimmed summary length above which it counts as substantive.
const SUMMARY_THRESHOLD: usize = 50;

/// Evaluate a single cycle's performance.
///
/// Reads the cycle log for status and cost, then compares the consensus
/// document against `previous_consensus` to detect change. The comparison
/// only happens when a previous snapshot is supplied; a missing consensus
/// file reads as empty.
///
/// Missing or unparsable cost evaluates to `0.0` here, unlike the raw
/// `CycleResult` which keeps it absent — trend math depends on the zero
/// default to exclude free cycles from average cost.
pub fn evaluate_cycle(
    cycle_log_path: &Path,
    consensus_path: &Path,
    previous_consensus: Option<&str>,
) -> DomainResult<CycleEvaluation> {
    if !cycle_log_path.is_file() {
        return Err(DomainError::CycleLogMissing(cycle_log_path.to_path_buf()));
    }

    let content = fs::read_to_string(cycle_log_path)?;
    let log = RawCycleLog::parse(&content);

    let status = log.status();
    let success = status == CycleStatus::Ok;
    let cost_usd = log.cost().unwrap_or(0.0);

    let consensus_changed = match previous_consensus {
        Some(previous) => {
            let current = fs::read_to_string(consensus_path).unwrap_or_default();
            current != previous
        }
        None => false,
    };

    let progress_score = progress_score(success, consensus_changed, log.summary());
    let issues = extract_issues(status, log.summary());

    Ok(CycleEvaluation {
        cycle_number: log.cycle_number(),
        success,
        cost_usd,
        consensus_changed,
        progress_score,
        issues,
    })
}

/// Additive progress score, capped at 1.0.
///
/// The weights are fixed policy constants, deliberately coarse.
fn progress_score(success: bool, consensus_changed: bool, summary: &str) -> f64 {
    let mut score = 0.0;
    if success {
        score += SUCCESS_WEIGHT;
    }
    if consensus_changed {
        score += CONSENSUS_WEIGHT;
    }
    if summary.trim().chars().count() > SUMMARY_THRESHOLD {
        score += SUMMARY_WEIGHT;
    }
    score.min(1.0)
}

/// Categorize issues from the cycle status and summary.
///
/// Failure signatures are checked in priority order; only the first match
/// is recorded. Statuses other than `timeout`/`fail` yield no tags.
fn extract_issues(status: CycleStatus, summary: &str) -> Vec<IssueTag> {
    match status {
        CycleStatus::Timeout => vec![IssueTag::Timeout],
        CycleStatus::Fail => {
            let lower = summary.to_lowercase();
            let tag = if lower.contains("rate limit") || lower.contains("429") {
                IssueTag::RateLimit
            } else if lower.contains("auth") || lower.contains("permission") {
                IssueTag::AuthError
            } else if lower.contains("timeout") {
                IssueTag::Timeout
            } else {
                IssueTag::GeneralFailure
            };
            vec![tag]
        }
        CycleStatus::Ok | CycleStatus::Unknown => vec![],
    }
}
