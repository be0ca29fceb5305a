//! Point-in-time projections of the on-disk loop state.

use serde::{Deserialize, Serialize};

/// Lifecycle phase reported by the loop state file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopStatus {
    /// A cycle is executing right now.
    Running,
    /// The loop is sleeping between cycles.
    Idle,
    /// The loop exited cleanly.
    Stopped,
    /// The loop is waiting out a provider rate limit.
    WaitingLimit,
    /// Too many consecutive errors tripped the circuit breaker.
    CircuitBreak,
    /// The state file carried no recognizable status.
    Unknown,
}

impl LoopStatus {
    /// Parse a state-file value; anything unrecognized is `Unknown`.
    pub fn parse(value: &str) -> Self {
        match value {
            "running" => Self::Running,
            "idle" => Self::Idle,
            "stopped" => Self::Stopped,
            "waiting_limit" => Self::WaitingLimit,
            "circuit_break" => Self::CircuitBreak,
            _ => Self::Unknown,
        }
    }

    /// The status's wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Idle => "idle",
            Self::Stopped => "stopped",
            Self::WaitingLimit => "waiting_limit",
            Self::CircuitBreak => "circuit_break",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for LoopStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable snapshot of the auto-loop state.
///
/// Re-derived from the state file on every read; there is no in-memory
/// cache to invalidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeStatus {
    /// Number of cycles completed so far.
    pub loop_count: u32,

    /// Current consecutive-error count.
    pub error_count: u32,

    /// Lifecycle phase.
    pub status: LoopStatus,

    /// Model the loop is driving, empty when unreported.
    pub model: String,

    /// Engine the loop is driving, empty when unreported.
    pub engine: String,

    /// Timestamp of the last cycle, empty when unreported.
    pub last_run: String,
}
