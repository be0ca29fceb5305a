//! Domain errors for the Foundry supervisor.

use std::path::PathBuf;
use thiserror::Error;

/// Domain-level errors that can occur while supervising a company loop.
///
/// Parse failures of machine-written files (state file, cycle logs) are
/// deliberately NOT represented here: they degrade to per-field defaults
/// so a single corrupt field never invalidates a whole record.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The external driver artifact is absent from its expected location.
    #[error("Driver script not found: {0}")]
    MissingDriver(PathBuf),

    /// A live loop process is already associated with the output directory.
    #[error("Auto-loop is already running")]
    AlreadyRunning,

    /// The cycle log selected for evaluation does not exist.
    #[error("Cycle log not found: {0}")]
    CycleLogMissing(PathBuf),

    /// The consensus document is absent where one is required.
    #[error("Consensus file not found: {0}")]
    ConsensusMissing(PathBuf),

    /// The backup file to restore from is absent.
    #[error("Backup file not found: {0}")]
    BackupMissing(PathBuf),

    /// Routing was attempted over an empty provider list.
    #[error("No providers available")]
    NoProviders,

    /// The external stop mechanism exited nonzero or timed out.
    #[error("Failed to stop loop: {stderr}")]
    StopFailed {
        /// Captured stderr (or stdout fallback) of the stop command.
        stderr: String,
    },

    /// An outbound command was rejected by the guardrail validator.
    #[error("Command rejected by guardrails: {reason}")]
    UnsafeCommand {
        /// The matched pattern or forbidden phrase.
        reason: String,
    },

    /// Underlying I/O failure from a process-lifecycle operation.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for domain results.
pub type DomainResult<T> = Result<T, DomainError>;
