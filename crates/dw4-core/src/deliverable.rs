use crate::config::Config;
use crate::error::Result;
use crate::types::Stage;
use crate::vcs::VersionControl;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverableStatus {
    pub path: PathBuf,
    pub present: bool,
}

/// Maps stages to the artifact whose existence marks them complete.
/// Content is never inspected.
pub struct DeliverableChecker<'a> {
    root: &'a Path,
    config: &'a Config,
}

impl<'a> DeliverableChecker<'a> {
    pub fn new(root: &'a Path, config: &'a Config) -> Self {
        Self { root, config }
    }

    /// Project-relative path of the expected artifact. `None` for Coder.
    pub fn required_artifact(&self, stage: Stage) -> Option<&'a Path> {
        self.config.deliverable_for(stage)
    }

    pub fn status(&self, stage: Stage) -> Option<DeliverableStatus> {
        let rel = self.required_artifact(stage)?;
        Some(DeliverableStatus {
            path: rel.to_path_buf(),
            present: crate::paths::resolve(self.root, rel).exists(),
        })
    }

    /// File-backed stages check existence; Coder asks version control for
    /// new commits.
    pub fn is_satisfied(&self, stage: Stage, vcs: &dyn VersionControl) -> Result<bool> {
        match self.status(stage) {
            Some(s) => Ok(s.present),
            None => vcs.has_new_commits(),
        }
    }

    /// Operator-facing instruction for an unsatisfied stage.
    pub fn missing_detail(&self, stage: Stage) -> String {
        match self.required_artifact(stage) {
            None => "no new commits detected; make one or more commits to proceed".to_string(),
            Some(rel) => {
                let name = rel
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| rel.display().to_string());
                let parent = rel
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| ".".to_string());
                format!("'{name}' not found in '{parent}'; write it before approving")
            }
        }
    }
}
