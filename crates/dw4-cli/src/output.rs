use dw4_core::state::ChecklistEntry;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Render checklist entries as `- [x] Stage` lines, indented by two spaces.
pub fn print_checklist(entries: &[ChecklistEntry]) {
    for entry in entries {
        let mark = if entry.checked { "x" } else { " " };
        println!("  - [{mark}] {}", entry.stage);
    }
}
