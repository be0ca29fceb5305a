//! Read, validate, back up, and restore the shared consensus document.
//!
//! The consensus document is the single source of truth agents read and
//! write across cycles. Every read re-parses the backing file; nothing is
//! cached.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::ConsensusState;

/// Section markers every valid consensus document must carry.
pub const REQUIRED_SECTIONS: [&str; 3] =
    ["# Auto Company Consensus", "## Company State", "## Next Action"];

/// Parse the consensus document into structured state.
///
/// A missing file yields an all-empty state, not an error.
pub fn read_consensus(path: &Path) -> ConsensusState {
    let Ok(content) = fs::read_to_string(path) else {
        return ConsensusState::default();
    };

    ConsensusState {
        company_state: extract_section(&content, "## Company State"),
        current_focus: extract_section(&content, "## Current Focus"),
        active_projects: extract_section(&content, "## Active Projects"),
        next_action: extract_section(&content, "## Next Action"),
        decision_log: extract_section(&content, "## Decision Log"),
        raw_content: content,
    }
}

/// Text strictly between a header line and the next `## ` header or end of
/// document, trimmed of surrounding whitespace.
fn extract_section(content: &str, header: &str) -> String {
    let pattern = format!(r"(?s){}\n(.*?)(\n## |\z)", regex::escape(header));
    let Ok(re) = Regex::new(&pattern) else {
        return String::new();
    };
    re.captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Validate that the consensus document carries its required sections.
///
/// A missing or zero-length file is invalid with a single error;
/// otherwise one error is reported per absent marker. Marker absence is a
/// validation failure, not a parse failure — the document can still be
/// partially read.
pub fn validate_consensus(path: &Path) -> (bool, Vec<String>) {
    if !path.exists() {
        return (false, vec!["File does not exist".to_string()]);
    }

    let content = fs::read_to_string(path).unwrap_or_default();
    if content.is_empty() {
        return (false, vec!["File is empty".to_string()]);
    }

    let errors: Vec<String> = REQUIRED_SECTIONS
        .iter()
        .filter(|section| !content.contains(*section))
        .map(|section| format!("Missing required section: {section}"))
        .collect();

    (errors.is_empty(), errors)
}

/// Write a timestamped byte-identical backup alongside the original.
pub fn backup_consensus(path: &Path) -> DomainResult<PathBuf> {
    if !path.exists() {
        return Err(DomainError::ConsensusMissing(path.to_path_buf()));
    }

    let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let backup_path = path.with_extension(format!("{timestamp}.bak"));
    fs::copy(path, &backup_path)?;
    Ok(backup_path)
}

/// Overwrite the consensus document with a backup's bytes.
pub fn restore_consensus(path: &Path, backup_path: &Path) -> DomainResult<()> {
    if !backup_path.exists() {
        return Err(DomainError::BackupMissing(backup_path.to_path_buf()));
    }

    fs::copy(backup_path, path)?;
    Ok(())
}
