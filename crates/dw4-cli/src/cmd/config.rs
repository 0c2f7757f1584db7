use super::Session;
use crate::output::print_json;
use clap::Subcommand;
use dw4_core::config::{Config, WarnLevel};
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the effective configuration (defaults applied)
    Show,

    /// Validate the config for common mistakes
    Validate,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    let session = Session::open(root)?;
    match subcmd {
        ConfigSubcommand::Show => show(session.config(), json),
        ConfigSubcommand::Validate => validate(session.config(), json),
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(config: &Config, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(config);
    }

    println!("Master file:   {}", config.documents.master.display());
    println!("Requirements:  {}", config.documents.requirements.display());
    println!("Approval log:  {}", config.documents.approvals.display());
    println!("Baseline file: {}", config.git.baseline_file.display());
    println!("Push on cycle: {}", config.git.push);
    println!("Validation:    {}", config.validation.command);
    println!("\nDeliverables:");
    for (stage, path) in &config.deliverables {
        println!("  {:<11} {}", stage.as_str(), path.display());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(config: &Config, json: bool) -> anyhow::Result<()> {
    let warnings = config.validate();

    if json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }

    Ok(())
}
