use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const DW4_DIR: &str = ".dw4";
pub const CONFIG_FILE: &str = ".dw4/config.yaml";

pub const MASTER_FILE: &str = "docs/WORKFLOW_MASTER.md";
pub const REQUIREMENTS_FILE: &str = "docs/PROJECT_REQUIREMENTS.md";
pub const APPROVAL_FILE: &str = "docs/PROJECT_APPROVAL.md";

pub const PLAN_FILE: &str = "deliverables/plan/PLAN.md";
pub const RESEARCH_FILE: &str = "deliverables/research/RESEARCH.md";
pub const VALIDATION_FILE: &str = "deliverables/validation/VALIDATION.md";
pub const DEPLOYMENT_FILE: &str = "deliverables/deployment/DEPLOYMENT.md";

pub const BASELINE_FILE: &str = ".last_commit_sha";

pub const DEFAULT_VALIDATION_COMMAND: &str = "python3 tests/run_tests.py";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Join `relative` onto `root` unless it is already absolute.
pub fn resolve(root: &Path, relative: &Path) -> PathBuf {
    if relative.is_absolute() {
        relative.to_path_buf()
    } else {
        root.join(relative)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            config_path(root),
            PathBuf::from("/tmp/proj/.dw4/config.yaml")
        );
        assert_eq!(
            resolve(root, Path::new(MASTER_FILE)),
            PathBuf::from("/tmp/proj/docs/WORKFLOW_MASTER.md")
        );
        assert_eq!(
            resolve(root, Path::new("/abs/plan.md")),
            PathBuf::from("/abs/plan.md")
        );
    }
}
