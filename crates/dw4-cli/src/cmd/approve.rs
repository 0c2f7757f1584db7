use super::Session;
use crate::output::print_json;
use anyhow::Context;
use dw4_core::{engine::Transition, types::Stage, vcs::PushOutcome};
use std::path::Path;
use std::str::FromStr;

/// `dw4 approve` (no target) and `dw4 advance <stage>`.
pub fn run(root: &Path, target: Option<&str>, json: bool) -> anyhow::Result<()> {
    let target = target
        .map(|s| Stage::from_str(s).with_context(|| format!("unknown stage: {s}")))
        .transpose()?;

    let session = Session::open(root)?;
    let mut state = session.load_state()?;
    let engine = session.engine();

    let transition = match target {
        Some(stage) => engine.advance_to(&mut state, stage)?,
        None => engine.approve(&mut state)?,
    };

    if json {
        return print_json(&transition);
    }

    print_transition(&transition);
    Ok(())
}

fn print_transition(t: &Transition) {
    if let Some(commit) = &t.commit {
        if commit.committed {
            println!("[GIT] Code committed for requirement {}.", t.requirement_pointer);
        } else {
            println!("[GIT] Working directory is clean. No new commit created.");
        }
    }

    match &t.push {
        Some(PushOutcome::Pushed) => println!("[GIT] Push successful."),
        Some(PushOutcome::Skipped) => println!("[GIT] Push disabled in config; skipped."),
        Some(PushOutcome::Failed { diagnostic }) => {
            eprintln!("[GIT] Push failed; check the remote configuration.");
            if !diagnostic.is_empty() {
                eprintln!("{diagnostic}");
            }
        }
        None => {}
    }

    if let Some(cycle) = &t.cycle {
        println!("[INFO] Logged approval for requirement {}.", cycle.requirement);
        if cycle.checked_off {
            println!("[INFO] Checked off requirement {}.", cycle.requirement);
        } else {
            eprintln!(
                "[WARN] No unchecked entry for requirement {} in the requirements document.",
                cycle.requirement
            );
        }
        println!(
            "[INFO] Advanced to next requirement: {}.",
            cycle.next_requirement
        );
    }

    if let Some(sha) = &t.baseline {
        println!("[GIT] Saved current commit SHA: {sha}");
    }

    println!("Advanced workflow. Current stage is now: {}", t.to);
}
