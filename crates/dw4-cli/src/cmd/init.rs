use crate::output::print_json;
use anyhow::Context;
use dw4_core::{config::Config, io, paths, types::Stage};
use std::path::{Path, PathBuf};

const REQUIREMENTS_TEMPLATE: &str = "\
# Project Requirements

- [ ] **ID 1** – Describe the first requirement
";

fn master_template() -> String {
    let mut out = String::from(
        "# Workflow Master\n\
         \n\
         CurrentStage: Engineer  # Engineer, Researcher, Coder, Validator or Deployer\n\
         RequirementPointer: 1  # ID of the requirement in progress\n\
         \n\
         StageStatus (checklist):\n",
    );
    for stage in Stage::all() {
        out.push_str(&format!("- [ ] {stage}\n"));
    }
    out
}

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    if !json {
        println!("Initializing dw4 in: {}", root.display());
    }

    let mut created: Vec<PathBuf> = Vec::new();
    let mut existing: Vec<PathBuf> = Vec::new();
    let mut record = |rel: PathBuf, written: bool| {
        if written {
            created.push(rel);
        } else {
            existing.push(rel);
        }
    };

    // 1. Config first so the remaining paths honour an existing one.
    let config_path = paths::config_path(root);
    let config = if config_path.exists() {
        record(PathBuf::from(paths::CONFIG_FILE), false);
        Config::load(root).context("failed to load .dw4/config.yaml")?
    } else {
        let cfg = Config::default();
        cfg.save(root).context("failed to write .dw4/config.yaml")?;
        record(PathBuf::from(paths::CONFIG_FILE), true);
        cfg
    };

    // 2. Workflow documents.
    let documents = [
        (&config.documents.master, master_template()),
        (
            &config.documents.requirements,
            REQUIREMENTS_TEMPLATE.to_string(),
        ),
        (&config.documents.approvals, String::new()),
    ];
    for (rel, content) in documents {
        let path = paths::resolve(root, rel);
        let written = io::write_if_missing(&path, content.as_bytes())
            .with_context(|| format!("failed to write {}", path.display()))?;
        record(rel.clone(), written);
    }

    // 3. Deliverable directories.
    for rel in config.deliverables.values() {
        if let Some(parent) = paths::resolve(root, rel).parent() {
            io::ensure_dir(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    // 4. Keep the baseline tracking file out of commits.
    if config.git.baseline_file.is_relative() {
        let entry = config.git.baseline_file.to_string_lossy();
        io::ensure_gitignore_entry(root, &entry).context("failed to update .gitignore")?;
    }

    if json {
        return print_json(&serde_json::json!({
            "root": root,
            "created": created,
            "existing": existing,
        }));
    }

    for rel in &created {
        println!("  created: {}", rel.display());
    }
    for rel in &existing {
        println!("  exists:  {}", rel.display());
    }
    println!("\nNext: write the plan, then run: dw4 status");
    Ok(())
}
