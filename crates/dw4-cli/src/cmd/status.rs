use super::Session;
use crate::output::{print_checklist, print_json};
use dw4_core::{engine::StatusReport, types::Stage};
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let session = Session::open(root)?;
    let state = session.load_state()?;
    let report = session.engine().status(&state)?;

    if json {
        return print_json(&report);
    }

    print_report(&report);
    Ok(())
}

fn print_report(report: &StatusReport) {
    println!("CURRENT STAGE: {}", report.stage);
    println!("Requirement:   {}", report.requirement_pointer);

    if !report.checklist.is_empty() {
        println!("\nChecklist:");
        print_checklist(&report.checklist);
    }
    println!();

    match report.stage {
        Stage::Coder => {
            if report.new_commits == Some(true) {
                println!("New commits detected: ready for approval.");
            } else {
                println!("TASK: no new commits detected; commit your changes to proceed.");
            }
        }
        _ => {
            if let Some(outcome) = &report.validation {
                println!("VALIDATION PASSED ({})", outcome.command);
            }
            match &report.deliverable {
                Some(d) if d.present => {
                    println!("Deliverable ready: {}", d.path.display());
                }
                Some(d) => {
                    println!("TASK: write the deliverable '{}'.", d.path.display());
                }
                None => println!("No deliverable is required for this stage."),
            }
        }
    }

    if report.ready {
        println!(
            "\nTo approve this stage and advance to {}, run: dw4 approve",
            report.next_stage
        );
    }
}
