//! Narrow version-control contract used by the stage engine, plus the
//! `git` command-line implementation.
//!
//! "New commits" are measured against a baseline revision kept in a plain
//! tracking file (default `.last_commit_sha`). The first check with no
//! recorded baseline never reports new commits; it records HEAD instead.

use crate::config::Config;
use crate::error::{Dw4Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::OnceLock;

pub const INITIAL_COMMIT_MESSAGE: &str = "Initial commit: Project setup";

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitResult {
    pub committed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PushOutcome {
    Pushed,
    Skipped,
    Failed { diagnostic: String },
}

// ---------------------------------------------------------------------------
// VersionControl
// ---------------------------------------------------------------------------

pub trait VersionControl {
    /// Initialize a repository with an empty baseline commit if none exists.
    /// Returns true when something was created.
    fn ensure_repository(&self) -> Result<bool>;

    /// Compare the recorded baseline against HEAD. With no baseline on
    /// record, establishes one and reports false.
    fn has_new_commits(&self) -> Result<bool>;

    /// Persist the current HEAD as the baseline and return it.
    fn record_baseline(&self) -> Result<String>;

    /// Stage everything and commit it. Nothing staged is not an error.
    fn commit_all(&self, message: &str) -> Result<CommitResult>;

    /// Push the current branch. Never fails the caller.
    fn push(&self) -> PushOutcome;
}

// ---------------------------------------------------------------------------
// GitCli
// ---------------------------------------------------------------------------

pub struct GitCli {
    repo_root: PathBuf,
    baseline_file: PathBuf,
    /// Resolved on first use; `None` once the PATH lookup has failed.
    binary: OnceLock<Option<PathBuf>>,
}

impl GitCli {
    pub fn new(repo_root: impl Into<PathBuf>, baseline_file: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            baseline_file: baseline_file.into(),
            binary: OnceLock::new(),
        }
    }

    pub fn from_config(root: &Path, config: &Config) -> Self {
        Self::new(root, config.baseline_path(root))
    }

    fn binary(&self) -> Result<&Path> {
        self.binary
            .get_or_init(|| which::which("git").ok())
            .as_deref()
            .ok_or_else(|| Dw4Error::ToolNotFound("git".to_string()))
    }

    fn git(&self, args: &[&str]) -> Result<Output> {
        let binary = self.binary()?;
        tracing::debug!(args = %args.join(" "), "running git");
        Command::new(binary)
            .args(args)
            .current_dir(&self.repo_root)
            .output()
            .map_err(|e| Dw4Error::ExternalTool {
                tool: format!("git {}", args.join(" ")),
                detail: e.to_string(),
            })
    }

    /// Run git, require success, return trimmed stdout.
    fn git_checked(&self, args: &[&str]) -> Result<String> {
        let output = self.git(args)?;
        if !output.status.success() {
            return Err(Dw4Error::ExternalTool {
                tool: format!("git {}", args.first().unwrap_or(&"")),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn git_ok(&self, args: &[&str]) -> bool {
        self.git(args)
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    pub fn head(&self) -> Result<String> {
        self.git_checked(&["rev-parse", "HEAD"])
    }

    pub fn read_baseline(&self) -> Result<Option<String>> {
        if !self.baseline_file.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.baseline_file)?;
        let sha = raw.trim();
        Ok((!sha.is_empty()).then(|| sha.to_string()))
    }
}

impl VersionControl for GitCli {
    fn ensure_repository(&self) -> Result<bool> {
        let mut created = false;
        if !self.git_ok(&["rev-parse", "--is-inside-work-tree"]) {
            tracing::info!(root = %self.repo_root.display(), "not a git repository, initializing");
            self.git_checked(&["init"])?;
            self.git_checked(&["add", "."])?;
            created = true;
        }
        if !self.git_ok(&["rev-parse", "--verify", "HEAD"]) {
            self.git_checked(&["commit", "--allow-empty", "-m", INITIAL_COMMIT_MESSAGE])?;
            tracing::info!("created initial commit");
            created = true;
        }
        Ok(created)
    }

    fn has_new_commits(&self) -> Result<bool> {
        match self.read_baseline()? {
            Some(baseline) => {
                let head = self.head()?;
                Ok(baseline != head)
            }
            None => {
                self.ensure_repository()?;
                self.record_baseline()?;
                Ok(false)
            }
        }
    }

    fn record_baseline(&self) -> Result<String> {
        let head = self.head()?;
        crate::io::atomic_write(&self.baseline_file, head.as_bytes())?;
        tracing::info!(sha = %head, "recorded baseline revision");
        Ok(head)
    }

    fn commit_all(&self, message: &str) -> Result<CommitResult> {
        self.git_checked(&["add", "."])?;
        let diff = self.git(&["diff", "--staged", "--quiet"])?;
        match diff.status.code() {
            Some(0) => {
                tracing::info!("working tree clean, nothing to commit");
                Ok(CommitResult { committed: false })
            }
            Some(1) => {
                self.git_checked(&["commit", "-m", message])?;
                tracing::info!(%message, "committed staged changes");
                Ok(CommitResult { committed: true })
            }
            _ => Err(Dw4Error::ExternalTool {
                tool: "git diff".to_string(),
                detail: String::from_utf8_lossy(&diff.stderr).trim().to_string(),
            }),
        }
    }

    fn push(&self) -> PushOutcome {
        match self.git(&["push"]) {
            Ok(output) if output.status.success() => PushOutcome::Pushed,
            Ok(output) => PushOutcome::Failed {
                diagnostic: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            },
            Err(e) => PushOutcome::Failed {
                diagnostic: e.to_string(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
