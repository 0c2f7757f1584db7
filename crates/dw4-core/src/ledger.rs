//! Requirement bookkeeping: the approval log and the requirements checklist.
//!
//! Requirements are markdown list items of the form
//! `- [ ] **ID 7** – title` or `- [ ] ID 7 title`. Only the checkbox of the
//! completed ID is ever touched.

use crate::config::Config;
use crate::error::{Dw4Error, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

static REQUIREMENT_RE: OnceLock<Regex> = OnceLock::new();

fn requirement_re() -> &'static Regex {
    REQUIREMENT_RE.get_or_init(|| {
        Regex::new(r"^(\s*-\s*)\[\s\](\s*(?:\*\*ID\s+|ID\s+)(\d+)(?:\s*\*\*|\s|$).*)$").unwrap()
    })
}

/// One approval-log line, without the trailing newline.
pub fn approval_line(requirement: u64, at: DateTime<Utc>) -> String {
    format!(
        "Requirement {requirement} approved at {}",
        at.format(TIMESTAMP_FORMAT)
    )
}

/// If `line` is an unchecked entry for `requirement`, return it checked.
pub fn check_line(line: &str, requirement: u64) -> Option<String> {
    let caps = requirement_re().captures(line)?;
    let id: u64 = caps.get(3)?.as_str().parse().ok()?;
    if id != requirement {
        return None;
    }
    let prefix = caps.get(1)?;
    let rest = caps.get(2)?;
    Some(format!(
        "{}[x]{}",
        &line[..prefix.end()],
        &line[rest.start()..]
    ))
}

pub struct RequirementLedger {
    requirements: PathBuf,
    approvals: PathBuf,
}

impl RequirementLedger {
    pub fn new(requirements: impl Into<PathBuf>, approvals: impl Into<PathBuf>) -> Self {
        Self {
            requirements: requirements.into(),
            approvals: approvals.into(),
        }
    }

    pub fn from_config(root: &Path, config: &Config) -> Self {
        Self::new(config.requirements_path(root), config.approvals_path(root))
    }

    pub fn approvals_path(&self) -> &Path {
        &self.approvals
    }

    pub fn requirements_path(&self) -> &Path {
        &self.requirements
    }

    /// Append one line to the approval log. Existing lines are never touched.
    pub fn log_approval(&self, requirement: u64, at: DateTime<Utc>) -> Result<()> {
        let line = approval_line(requirement, at);
        crate::io::append_text(&self.approvals, &format!("{line}\n"))?;
        tracing::info!(requirement, "logged approval");
        Ok(())
    }

    /// Flip the first unchecked entry for `requirement` to checked.
    /// Returns false, without writing, when no such entry exists.
    pub fn check_off_requirement(&self, requirement: u64) -> Result<bool> {
        if !self.requirements.exists() {
            tracing::warn!(
                path = %self.requirements.display(),
                requirement,
                "requirements document missing; nothing checked off"
            );
            return Ok(false);
        }
        let content = std::fs::read_to_string(&self.requirements)?;
        let mut lines: Vec<String> = content.lines().map(str::to_string).collect();

        let Some((index, checked)) = lines
            .iter()
            .enumerate()
            .find_map(|(i, line)| check_line(line, requirement).map(|c| (i, c)))
        else {
            tracing::warn!(
                requirement,
                "no unchecked entry for requirement in requirements document"
            );
            return Ok(false);
        };

        lines[index] = checked;
        let updated = crate::io::join_lines(&lines, crate::io::line_ending(&content));
        crate::io::atomic_write(&self.requirements, updated.as_bytes())?;
        tracing::info!(requirement, "checked off requirement");
        Ok(true)
    }

    /// The next requirement ID. Fails instead of wrapping at `u64::MAX`.
    pub fn advance_pointer(current: u64) -> Result<u64> {
        current.checked_add(1).ok_or_else(|| {
            Dw4Error::InvalidState(format!(
                "requirement pointer {current} cannot be advanced any further"
            ))
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
