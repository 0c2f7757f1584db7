//! External test-runner invocation for the Validator stage.

use crate::error::{Dw4Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub command: String,
    pub passed: bool,
    /// `None` when the runner was killed by a signal.
    pub exit_code: Option<i32>,
}

pub trait TestRunner {
    fn run(&self, root: &Path) -> Result<TestOutcome>;
}

/// Runs a shell command in the project root. Output streams straight to
/// the operator's terminal. No timeout: a hung runner hangs the caller.
pub struct ShellTestRunner {
    command: String,
}

impl ShellTestRunner {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl TestRunner for ShellTestRunner {
    fn run(&self, root: &Path) -> Result<TestOutcome> {
        if self.command.trim().is_empty() {
            return Err(Dw4Error::ExternalTool {
                tool: "test runner".to_string(),
                detail: "validation command is empty".to_string(),
            });
        }
        tracing::info!(command = %self.command, "running validation");
        let status = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .current_dir(root)
            .status()
            .map_err(|e| Dw4Error::ExternalTool {
                tool: "test runner".to_string(),
                detail: format!("failed to spawn '{}': {e}", self.command),
            })?;
        Ok(TestOutcome {
            command: self.command.clone(),
            passed: status.success(),
            exit_code: status.code(),
        })
    }
}
