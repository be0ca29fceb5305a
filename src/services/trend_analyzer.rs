//! Aggregates a trailing window of cycle evaluations into trend signals.

use crate::domain::models::{CycleEvaluation, IssueTag, ProgressTrend, TrendSummary};

/// Default number of recent cycles considered.
pub const DEFAULT_WINDOW: usize = 5;

/// Progress-score delta beyond which a trend counts as movement.
const TREND_DELTA: f64 = 0.1;

/// Trend analyzer over a trailing evaluation window.
#[derive(Debug, Clone)]
pub struct TrendAnalyzer {
    window: usize,
}

impl TrendAnalyzer {
    /// Create an analyzer with a custom window size.
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    /// Summarize trends over the most recent evaluations.
    ///
    /// An empty input yields all-zero signals with a stagnant trend.
    pub fn analyze(&self, evaluations: &[CycleEvaluation]) -> TrendSummary {
        if evaluations.is_empty() {
            return TrendSummary {
                success_rate: 0.0,
                avg_cost: 0.0,
                progress_trend: ProgressTrend::Stagnant,
                repeated_issues: vec![],
            };
        }

        let start = evaluations.len().saturating_sub(self.window);
        let recent = &evaluations[start..];
        let total = recent.len();

        let success_count = recent.iter().filter(|e| e.success).count();
        #[allow(clippy::cast_precision_loss)]
        let success_rate = success_count as f64 / total as f64;

        // Zero-cost cycles are excluded from both numerator and denominator.
        let costs: Vec<f64> = recent.iter().map(|e| e.cost_usd).filter(|c| *c > 0.0).collect();
        let avg_cost = if costs.is_empty() {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let mean = costs.iter().sum::<f64>() / costs.len() as f64;
            mean
        };

        TrendSummary {
            success_rate,
            avg_cost,
            progress_trend: progress_trend(recent),
            repeated_issues: repeated_issues(recent),
        }
    }
}

impl Default for TrendAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

/// Compare mean progress of the window's two halves.
///
/// The first half gets the smaller share on odd lengths. Windows shorter
/// than two entries are always stagnant.
fn progress_trend(recent: &[CycleEvaluation]) -> ProgressTrend {
    if recent.len() < 2 {
        return ProgressTrend::Stagnant;
    }

    let midpoint = recent.len() / 2;
    let first = mean_progress(&recent[..midpoint]);
    let second = mean_progress(&recent[midpoint..]);

    let delta = second - first;
    if delta > TREND_DELTA {
        ProgressTrend::Improving
    } else if delta < -TREND_DELTA {
        ProgressTrend::Declining
    } else {
        ProgressTrend::Stagnant
    }
}

fn mean_progress(half: &[CycleEvaluation]) -> f64 {
    if half.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let mean = half.iter().map(|e| e.progress_score).sum::<f64>() / half.len() as f64;
    mean
}

/// Issue tags occurring more than once across the window, by descending
/// count; ties keep first-seen order.
fn repeated_issues(recent: &[CycleEvaluation]) -> Vec<(IssueTag, usize)> {
    let mut counts: Vec<(IssueTag, usize)> = Vec::new();

    for evaluation in recent {
        for issue in &evaluation.issues {
            match counts.iter_mut().find(|(tag, _)| tag == issue) {
                Some((_, count)) => *count += 1,
                None => counts.push((*issue, 1)),
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.retain(|(_, count)| *count > 1);
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(success: bool, cost: f64, progress: f64, issues: Vec<IssueTag>) -> CycleEvaluation {
        CycleEvaluation {
            cycle_number: 0,
            success,
            cost_usd: cost,
            consensus_changed: false,
            progress_score: progress,
            issues,
        }
    }

    #[test]
    fn test_empty_input_yields_stagnant_zeros() {
        let summary = TrendAnalyzer::default().analyze(&[]);
        assert_eq!(summary.success_rate, 0.0);
        assert_eq!(summary.avg_cost, 0.0);
        assert_eq!(summary.progress_trend, ProgressTrend::Stagnant);
        assert!(summary.repeated_issues.is_empty());
    }

    #[test]
    fn test_single_entry_window_is_stagnant() {
        let summary = TrendAnalyzer::default().analyze(&[eval(true, 1.0, 1.0, vec![])]);
        assert_eq!(summary.progress_trend, ProgressTrend::Stagnant);
        assert_eq!(summary.success_rate, 1.0);
    }

    #[test]
    fn test_success_rate_over_window() {
        let evals = vec![
            eval(true, 0.0, 0.5, vec![]),
            eval(false, 0.0, 0.0, vec![]),
            eval(true, 0.0, 0.5, vec![]),
            eval(true, 0.0, 0.5, vec![]),
        ];
        let summary = TrendAnalyzer::default().analyze(&evals);
        assert_eq!(summary.success_rate, 0.75);
    }

    #[test]
    fn test_window_limits_to_recent_entries() {
        // Six entries, window of five: the oldest failure falls out.
        let mut evals = vec![eval(false, 0.0, 0.0, vec![])];
        evals.extend((0..5).map(|_| eval(true, 0.0, 0.5, vec![])));

        let summary = TrendAnalyzer::default().analyze(&evals);
        assert_eq!(summary.success_rate, 1.0);
    }

    #[test]
    fn test_avg_cost_excludes_free_cycles() {
        let evals = vec![
            eval(true, 0.0, 0.5, vec![]),
            eval(true, 2.0, 0.5, vec![]),
            eval(true, 4.0, 0.5, vec![]),
        ];
        let summary = TrendAnalyzer::default().analyze(&evals);
        assert_eq!(summary.avg_cost, 3.0);
    }

    #[test]
    fn test_avg_cost_zero_when_all_free() {
        let evals = vec![eval(true, 0.0, 0.5, vec![]), eval(true, 0.0, 0.5, vec![])];
        let summary = TrendAnalyzer::default().analyze(&evals);
        assert_eq!(summary.avg_cost, 0.0);
    }

    #[test]
    fn test_improving_trend() {
        let evals = vec![
            eval(false, 0.0, 0.1, vec![]),
            eval(false, 0.0, 0.2, vec![]),
            eval(true, 0.0, 0.8, vec![]),
            eval(true, 0.0, 0.9, vec![]),
        ];
        let summary = TrendAnalyzer::default().analyze(&evals);
        assert_eq!(summary.progress_trend, ProgressTrend::Improving);
    }

    #[test]
    fn test_declining_trend() {
        let evals = vec![
            eval(true, 0.0, 0.9, vec![]),
            eval(true, 0.0, 0.8, vec![]),
            eval(false, 0.0, 0.1, vec![]),
            eval(false, 0.0, 0.0, vec![]),
        ];
        let summary = TrendAnalyzer::default().analyze(&evals);
        assert_eq!(summary.progress_trend, ProgressTrend::Declining);
    }

    #[test]
    fn test_odd_window_first_half_smaller() {
        // Five entries: first half is two, second half is three.
        let evals = vec![
            eval(false, 0.0, 0.0, vec![]),
            eval(false, 0.0, 0.0, vec![]),
            eval(true, 0.0, 0.5, vec![]),
            eval(true, 0.0, 0.5, vec![]),
            eval(true, 0.0, 0.5, vec![]),
        ];
        let summary = TrendAnalyzer::default().analyze(&evals);
        assert_eq!(summary.progress_trend, ProgressTrend::Improving);
    }

    #[test]
    fn test_repeated_issues_counted_and_ordered() {
        let evals = vec![
            eval(false, 0.0, 0.0, vec![IssueTag::Timeout]),
            eval(false, 0.0, 0.0, vec![IssueTag::RateLimit]),
            eval(false, 0.0, 0.0, vec![IssueTag::RateLimit]),
            eval(false, 0.0, 0.0, vec![IssueTag::Timeout]),
            eval(false, 0.0, 0.0, vec![IssueTag::RateLimit]),
        ];
        let summary = TrendAnalyzer::default().analyze(&evals);
        assert_eq!(
            summary.repeated_issues,
            vec![(IssueTag::RateLimit, 3), (IssueTag::Timeout, 2)]
        );
    }

    #[test]
    fn test_singleton_issues_not_reported() {
        let evals = vec![
            eval(false, 0.0, 0.0, vec![IssueTag::AuthError]),
            eval(true, 0.0, 0.5, vec![]),
        ];
        let summary = TrendAnalyzer::default().analyze(&evals);
        assert!(summary.repeated_issues.is_empty());
    }

    #[test]
    fn test_repeated_issue_tie_keeps_first_seen_order() {
        let evals = vec![
            eval(false, 0.0, 0.0, vec![IssueTag::Timeout]),
            eval(false, 0.0, 0.0, vec![IssueTag::RateLimit]),
            eval(false, 0.0, 0.0, vec![IssueTag::Timeout]),
            eval(false, 0.0, 0.0, vec![IssueTag::RateLimit]),
        ];
        let summary = TrendAnalyzer::default().analyze(&evals);
        assert_eq!(
            summary.repeated_issues,
            vec![(IssueTag::Timeout, 2), (IssueTag::RateLimit, 2)]
        );
    }
}
