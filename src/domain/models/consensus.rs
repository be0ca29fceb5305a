//! Structured view over the shared consensus document.

use serde::{Deserialize, Serialize};

/// Parsed state from the consensus document.
///
/// Sections are optional; any absent section defaults to an empty string.
/// Re-derived from disk on every read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusState {
    /// Contents of the `## Company State` section.
    pub company_state: String,

    /// Contents of the `## Current Focus` section.
    pub current_focus: String,

    /// Contents of the `## Active Projects` section.
    pub active_projects: String,

    /// Contents of the `## Next Action` section.
    pub next_action: String,

    /// Contents of the `## Decision Log` section.
    pub decision_log: String,

    /// The document as read from disk, unmodified.
    pub raw_content: String,
}
