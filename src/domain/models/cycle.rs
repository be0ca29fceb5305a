//! Cycle outcome records and the line-oriented cycle-log format.
//!
//! A cycle log is `key: value` lines, a lone `---` separator, then
//! free-text summary. The format is contractual: the driver script writes
//! it and both the runtime controller and the cycle evaluator read it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Outcome status of a single cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    /// The cycle completed successfully.
    Ok,
    /// The cycle failed.
    Fail,
    /// The cycle was killed by its timeout.
    Timeout,
    /// The log carried no recognizable status.
    Unknown,
}

impl CycleStatus {
    /// Parse a log value; anything unrecognized is `Unknown`.
    pub fn parse(value: &str) -> Self {
        match value {
            "ok" => Self::Ok,
            "fail" => Self::Fail,
            "timeout" => Self::Timeout,
            _ => Self::Unknown,
        }
    }

    /// The status's wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Fail => "fail",
            Self::Timeout => "timeout",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed view over raw cycle-log content.
///
/// Field interpretation is left to the caller: the runtime controller
/// keeps a missing cost as `None` while the evaluator defaults it to zero.
/// The two behaviors are intentionally distinct — trend math relies on the
/// zero default to exclude free cycles from average-cost computation.
#[derive(Debug, Clone, Default)]
pub struct RawCycleLog {
    fields: HashMap<String, String>,
    summary: String,
}

impl RawCycleLog {
    /// Split log content into header fields and free-text summary.
    ///
    /// Malformed lines are ignored; this never fails.
    pub fn parse(content: &str) -> Self {
        let mut fields = HashMap::new();
        let mut summary_lines: Vec<&str> = Vec::new();
        let mut past_separator = false;

        for line in content.trim().lines() {
            if line.trim() == "---" {
                past_separator = true;
                continue;
            }
            if past_separator {
                summary_lines.push(line);
            } else if let Some((key, value)) = line.split_once(':') {
                fields.insert(key.trim().to_string(), value.trim().to_string());
            }
        }

        Self {
            fields,
            summary: summary_lines.join("\n"),
        }
    }

    /// Raw header field by key.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Cycle status; `Unknown` when the field is missing.
    pub fn status(&self) -> CycleStatus {
        self.field("status").map_or(CycleStatus::Unknown, CycleStatus::parse)
    }

    /// Cycle number; zero when missing or unparsable.
    pub fn cycle_number(&self) -> u32 {
        self.field("cycle").and_then(|v| v.parse().ok()).unwrap_or(0)
    }

    /// Cycle cost in USD; `None` when missing, empty, or unparsable.
    pub fn cost(&self) -> Option<f64> {
        self.field("cost").filter(|v| !v.is_empty()).and_then(|v| v.parse().ok())
    }

    /// Timestamp field; empty when unreported.
    pub fn timestamp(&self) -> &str {
        self.field("timestamp").unwrap_or("")
    }

    /// Free-text summary after the separator.
    pub fn summary(&self) -> &str {
        &self.summary
    }
}

/// Immutable record of a single cycle's outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleResult {
    /// Cycle sequence number.
    pub cycle_number: u32,

    /// Outcome status.
    pub status: CycleStatus,

    /// Reported cost in USD; absent when the log carried none.
    pub cost_usd: Option<f64>,

    /// Free-text summary of what the cycle did.
    pub summary: String,

    /// Timestamp the driver recorded for the cycle.
    pub timestamp: String,
}

impl CycleResult {
    /// Build a result from a parsed log, preserving absent cost as `None`.
    pub fn from_log(log: &RawCycleLog) -> Self {
        Self {
            cycle_number: log.cycle_number(),
            status: log.status(),
            cost_usd: log.cost(),
            summary: log.summary().to_string(),
            timestamp: log.timestamp().to_string(),
        }
    }
}
