//! The workflow master file: a human-edited markdown document holding
//! `Key: value  # comment` lines and a stage checklist block.
//!
//! # Grammar
//!
//! Each line is classified independently:
//!
//! ```text
//! checklist-item := ws "- [" (" " | "x" | "X") "]" ws label
//! key-value      := ws key ":" value [ "#" comment ]      (first colon splits)
//! other          := anything else, kept verbatim
//! ```
//!
//! The checklist section starts after the `StageStatus (checklist):` line and
//! runs until the first non-blank line that is not a checklist item.
//!
//! Only lines touched by [`WorkflowState::set`] or
//! [`WorkflowState::mark_checklist`] are rewritten; everything else survives
//! a load/save cycle byte-for-byte (modulo the trailing newline). A file
//! written with CRLF line endings is saved with CRLF.

use crate::error::{Dw4Error, Result};
use crate::types::Stage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const CURRENT_STAGE_KEY: &str = "CurrentStage";
pub const REQUIREMENT_POINTER_KEY: &str = "RequirementPointer";
pub const CHECKLIST_HEADER: &str = "StageStatus (checklist):";

// ---------------------------------------------------------------------------
// Line grammar
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    KeyValue { key: &'a str, value: &'a str },
    ChecklistItem { checked: bool, label: &'a str },
    Other,
}

pub fn parse_line(line: &str) -> Line<'_> {
    if let Some(item) = parse_checklist_item(line) {
        return item;
    }
    match line.split_once(':') {
        Some((key, rest)) => {
            let value = match rest.split_once('#') {
                Some((v, _comment)) => v,
                None => rest,
            };
            Line::KeyValue {
                key: key.trim(),
                value: value.trim(),
            }
        }
        None => Line::Other,
    }
}

fn parse_checklist_item(line: &str) -> Option<Line<'_>> {
    let rest = line.trim_start().strip_prefix("- [")?;
    let mut chars = rest.chars();
    let checked = match chars.next()? {
        ' ' => false,
        'x' | 'X' => true,
        _ => return None,
    };
    let label = chars.as_str().strip_prefix(']')?;
    Some(Line::ChecklistItem {
        checked,
        label: label.trim(),
    })
}

/// Rewrite the value of a `key:` line, keeping its indentation and any
/// trailing comment together with the whitespace in front of `#`.
fn rewrite_value(line: &str, key: &str, value: &str) -> String {
    let indent_len = line.len() - line.trim_start().len();
    let indent = &line[..indent_len];
    let rest = &line[indent_len + key.len() + 1..];
    let comment = match rest.find('#') {
        Some(pos) => {
            let before = &rest[..pos];
            let gap = &before[before.trim_end().len()..];
            let gap = if gap.is_empty() { " " } else { gap };
            format!("{gap}{}", &rest[pos..])
        }
        None => String::new(),
    };
    format!("{indent}{key}: {value}{comment}")
}

// ---------------------------------------------------------------------------
// ChecklistEntry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistEntry {
    pub stage: Stage,
    pub checked: bool,
}

// ---------------------------------------------------------------------------
// WorkflowState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct WorkflowState {
    path: PathBuf,
    lines: Vec<String>,
    eol: &'static str,
    values: HashMap<String, String>,
}

impl WorkflowState {
    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Dw4Error::NotInitialized(path.to_path_buf()));
        }
        let data = std::fs::read_to_string(path)?;
        Ok(Self::parse(path, &data))
    }

    pub fn parse(path: &Path, content: &str) -> Self {
        let lines: Vec<String> = content.lines().map(str::to_string).collect();
        let mut values = HashMap::new();
        for line in &lines {
            // Last occurrence of a duplicate key wins.
            if let Line::KeyValue { key, value } = parse_line(line) {
                values.insert(key.to_string(), value.to_string());
            }
        }
        tracing::debug!(path = %path.display(), keys = values.len(), "parsed workflow state");
        Self {
            path: path.to_path_buf(),
            lines,
            eol: crate::io::line_ending(content),
            values,
        }
    }

    pub fn render(&self) -> String {
        crate::io::join_lines(&self.lines, self.eol)
    }

    pub fn save(&self) -> Result<()> {
        crate::io::atomic_write(&self.path, self.render().as_bytes())
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    // -----------------------------------------------------------------------
    // Key/value access
    // -----------------------------------------------------------------------

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Rewrite the first `key:` line in place, or append one at the end.
    pub fn set(&mut self, key: &str, value: impl ToString) {
        let value = value.to_string();
        let prefix = format!("{key}:");
        match self
            .lines
            .iter_mut()
            .find(|line| line.trim_start().starts_with(&prefix))
        {
            Some(line) => *line = rewrite_value(line, key, &value),
            None => self.lines.push(format!("{key}: {value}")),
        }
        self.values.insert(key.to_string(), value);
    }

    // -----------------------------------------------------------------------
    // Typed fields
    // -----------------------------------------------------------------------

    pub fn current_stage(&self) -> Result<Stage> {
        let raw = self.get(CURRENT_STAGE_KEY).ok_or_else(|| {
            Dw4Error::InvalidState(format!(
                "'{CURRENT_STAGE_KEY}' missing from {}",
                self.path.display()
            ))
        })?;
        raw.parse()
    }

    pub fn set_current_stage(&mut self, stage: Stage) {
        self.set(CURRENT_STAGE_KEY, stage);
    }

    pub fn requirement_pointer(&self) -> Result<u64> {
        let raw = self.get(REQUIREMENT_POINTER_KEY).ok_or_else(|| {
            Dw4Error::InvalidState(format!(
                "'{REQUIREMENT_POINTER_KEY}' missing from {}",
                self.path.display()
            ))
        })?;
        match raw.parse::<u64>() {
            Ok(n) if n >= 1 => Ok(n),
            _ => Err(Dw4Error::InvalidState(format!(
                "'{REQUIREMENT_POINTER_KEY}' must be an integer >= 1, got '{raw}'"
            ))),
        }
    }

    pub fn set_requirement_pointer(&mut self, pointer: u64) {
        self.set(REQUIREMENT_POINTER_KEY, pointer);
    }

    // -----------------------------------------------------------------------
    // Checklist
    // -----------------------------------------------------------------------

    fn checklist_range(&self) -> Option<std::ops::Range<usize>> {
        let header = self
            .lines
            .iter()
            .position(|l| l.trim().starts_with(CHECKLIST_HEADER))?;
        let start = header + 1;
        let mut end = start;
        for (i, line) in self.lines.iter().enumerate().skip(start) {
            if line.trim().is_empty() {
                continue;
            }
            if !matches!(parse_line(line), Line::ChecklistItem { .. }) {
                break;
            }
            end = i + 1;
        }
        Some(start..end)
    }

    /// Stage entries of the checklist block, in file order. Items whose label
    /// is not a stage name are skipped.
    pub fn checklist(&self) -> Vec<ChecklistEntry> {
        let Some(range) = self.checklist_range() else {
            return Vec::new();
        };
        self.lines[range]
            .iter()
            .filter_map(|line| match parse_line(line) {
                Line::ChecklistItem { checked, label } => label
                    .parse::<Stage>()
                    .ok()
                    .map(|stage| ChecklistEntry { stage, checked }),
                _ => None,
            })
            .collect()
    }

    /// Check the box for `stage`. Never clears other entries. Returns true
    /// if a line changed.
    pub fn mark_checklist(&mut self, stage: Stage) -> bool {
        let Some(range) = self.checklist_range() else {
            tracing::debug!("no '{CHECKLIST_HEADER}' section; checklist left alone");
            return false;
        };
        for line in &mut self.lines[range] {
            let Line::ChecklistItem { checked, label } = parse_line(line) else {
                continue;
            };
            if !label.eq_ignore_ascii_case(stage.as_str()) {
                continue;
            }
            if checked {
                return false;
            }
            *line = line.replacen("[ ]", "[x]", 1);
            return true;
        }
        false
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
