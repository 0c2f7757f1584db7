use crate::error::Result;
use crate::paths;
use crate::types::Stage;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Component, Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// DocumentsConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentsConfig {
    #[serde(default = "default_master")]
    pub master: PathBuf,
    #[serde(default = "default_requirements")]
    pub requirements: PathBuf,
    #[serde(default = "default_approvals")]
    pub approvals: PathBuf,
}

fn default_master() -> PathBuf {
    PathBuf::from(paths::MASTER_FILE)
}

fn default_requirements() -> PathBuf {
    PathBuf::from(paths::REQUIREMENTS_FILE)
}

fn default_approvals() -> PathBuf {
    PathBuf::from(paths::APPROVAL_FILE)
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            master: default_master(),
            requirements: default_requirements(),
            approvals: default_approvals(),
        }
    }
}

// ---------------------------------------------------------------------------
// GitConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    #[serde(default = "default_baseline_file")]
    pub baseline_file: PathBuf,
    /// When false the Deployer → Engineer push is skipped entirely.
    #[serde(default = "default_push")]
    pub push: bool,
}

fn default_baseline_file() -> PathBuf {
    PathBuf::from(paths::BASELINE_FILE)
}

fn default_push() -> bool {
    true
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            baseline_file: default_baseline_file(),
            push: default_push(),
        }
    }
}

// ---------------------------------------------------------------------------
// ValidationConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Shell command run by `status` while in the Validator stage.
    #[serde(default = "default_validation_command")]
    pub command: String,
}

fn default_validation_command() -> String {
    paths::DEFAULT_VALIDATION_COMMAND.to_string()
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            command: default_validation_command(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub documents: DocumentsConfig,
    /// Entries override the defaults stage by stage; stages left out keep
    /// their default artifact.
    #[serde(default = "default_deliverables", deserialize_with = "merge_deliverables")]
    pub deliverables: BTreeMap<Stage, PathBuf>,
    #[serde(default)]
    pub git: GitConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
}

fn default_version() -> u32 {
    1
}

fn default_deliverable(stage: Stage) -> Option<&'static Path> {
    let rel = match stage {
        Stage::Engineer => paths::PLAN_FILE,
        Stage::Researcher => paths::RESEARCH_FILE,
        Stage::Validator => paths::VALIDATION_FILE,
        Stage::Deployer => paths::DEPLOYMENT_FILE,
        Stage::Coder => return None,
    };
    Some(Path::new(rel))
}

fn default_deliverables() -> BTreeMap<Stage, PathBuf> {
    Stage::all()
        .iter()
        .filter_map(|&stage| default_deliverable(stage).map(|p| (stage, p.to_path_buf())))
        .collect()
}

fn merge_deliverables<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<Stage, PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    let overrides = Option::<BTreeMap<Stage, PathBuf>>::deserialize(deserializer)?;
    let mut merged = default_deliverables();
    merged.extend(overrides.unwrap_or_default());
    Ok(merged)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            documents: DocumentsConfig::default(),
            deliverables: default_deliverables(),
            git: GitConfig::default(),
            validation: ValidationConfig::default(),
        }
    }
}

impl Config {
    /// Load `.dw4/config.yaml`, falling back to defaults when it is absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn master_path(&self, root: &Path) -> PathBuf {
        paths::resolve(root, &self.documents.master)
    }

    pub fn requirements_path(&self, root: &Path) -> PathBuf {
        paths::resolve(root, &self.documents.requirements)
    }

    pub fn approvals_path(&self, root: &Path) -> PathBuf {
        paths::resolve(root, &self.documents.approvals)
    }

    pub fn baseline_path(&self, root: &Path) -> PathBuf {
        paths::resolve(root, &self.git.baseline_file)
    }

    /// The deliverable for `stage`, falling back to the default location.
    /// Coder never has one: its completion signal is version-control
    /// activity.
    pub fn deliverable_for(&self, stage: Stage) -> Option<&Path> {
        if stage == Stage::Coder {
            return None;
        }
        self.deliverables
            .get(&stage)
            .map(|p| p.as_path())
            .or_else(|| default_deliverable(stage))
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.deliverables.contains_key(&Stage::Coder) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "deliverables.Coder is ignored: the Coder stage is gated on new commits"
                    .to_string(),
            });
        }

        let mut seen = HashSet::new();
        for (stage, path) in &self.deliverables {
            if path.is_absolute()
                || path.components().any(|c| matches!(c, Component::ParentDir))
            {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "deliverable for {stage} points outside the project: {}",
                        path.display()
                    ),
                });
            }
            if !seen.insert(path) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!(
                        "deliverable path {} is shared by more than one stage",
                        path.display()
                    ),
                });
            }
        }

        if self.validation.command.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "validation.command is empty".to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg.documents.master, PathBuf::from(paths::MASTER_FILE));
        assert_eq!(
            cfg.deliverable_for(Stage::Engineer),
            Some(Path::new(paths::PLAN_FILE))
        );
        assert_eq!(cfg.deliverable_for(Stage::Coder), None);
        assert!(cfg.git.push);
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".dw4")).unwrap();
        std::fs::write(
            dir.path().join(".dw4/config.yaml"),
            "git:\n  push: false\nvalidation:\n  command: cargo test\n",
        )
        .unwrap();

        let cfg = Config::load(dir.path()).unwrap();
        assert!(!cfg.git.push);
        assert_eq!(cfg.git.baseline_file, PathBuf::from(".last_commit_sha"));
        assert_eq!(cfg.validation.command, "cargo test");
        assert_eq!(cfg.deliverables.len(), 4);
    }

    #[test]
    fn partial_deliverables_merge_over_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".dw4")).unwrap();
        std::fs::write(
            dir.path().join(".dw4/config.yaml"),
            "deliverables:\n  Engineer: PLAN.md\n",
        )
        .unwrap();

        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg.deliverables.len(), 4);
        assert_eq!(
            cfg.deliverable_for(Stage::Engineer),
            Some(Path::new("PLAN.md"))
        );
        assert_eq!(
            cfg.deliverable_for(Stage::Researcher),
            Some(Path::new(paths::RESEARCH_FILE))
        );
    }

    #[test]
    fn empty_deliverables_key_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".dw4")).unwrap();
        std::fs::write(dir.path().join(".dw4/config.yaml"), "deliverables:\n").unwrap();

        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg.deliverables, default_deliverables());
    }

    #[test]
    fn removed_entry_falls_back_to_default() {
        let mut cfg = Config::default();
        cfg.deliverables.remove(&Stage::Validator);
        assert_eq!(
            cfg.deliverable_for(Stage::Validator),
            Some(Path::new(paths::VALIDATION_FILE))
        );
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::default();
        cfg.deliverables
            .insert(Stage::Engineer, PathBuf::from("PLAN.md"));
        cfg.save(dir.path()).unwrap();

        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(
            loaded.deliverable_for(Stage::Engineer),
            Some(Path::new("PLAN.md"))
        );
    }

    #[test]
    fn validate_flags_problems() {
        let mut cfg = Config::default();
        cfg.deliverables
            .insert(Stage::Coder, PathBuf::from("code.md"));
        cfg.deliverables
            .insert(Stage::Researcher, PathBuf::from(paths::PLAN_FILE));
        cfg.deliverables
            .insert(Stage::Deployer, PathBuf::from("../deploy.md"));
        cfg.validation.command = "  ".to_string();

        let warnings = cfg.validate();
        let errors = warnings
            .iter()
            .filter(|w| w.level == WarnLevel::Error)
            .count();
        assert_eq!(errors, 2, "{warnings:?}");
        assert!(warnings.iter().any(|w| w.message.contains("Coder")));
        assert!(warnings.iter().any(|w| w.message.contains("outside")));
    }
}
