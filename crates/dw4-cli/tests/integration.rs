#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

const MASTER: &str = "docs/WORKFLOW_MASTER.md";
const REQUIREMENTS: &str = "docs/PROJECT_REQUIREMENTS.md";
const APPROVALS: &str = "docs/PROJECT_APPROVAL.md";

fn dw4(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("dw4").unwrap();
    cmd.current_dir(dir.path())
        .env("DW4_ROOT", dir.path())
        .env("GIT_CONFIG_GLOBAL", "/dev/null")
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("GIT_AUTHOR_NAME", "dw4")
        .env("GIT_AUTHOR_EMAIL", "dw4@example.com")
        .env("GIT_COMMITTER_NAME", "dw4")
        .env("GIT_COMMITTER_EMAIL", "dw4@example.com");
    cmd
}

fn init_project(dir: &TempDir) {
    dw4(dir).arg("init").assert().success();
}

fn read(dir: &TempDir, rel: &str) -> String {
    std::fs::read_to_string(dir.path().join(rel)).unwrap()
}

fn write(dir: &TempDir, rel: &str, content: &str) {
    let path = dir.path().join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn set_stage(dir: &TempDir, stage: &str, pointer: u64) {
    let master = read(dir, MASTER)
        .replace(
            "CurrentStage: Engineer",
            &format!("CurrentStage: {stage}"),
        )
        .replace(
            "RequirementPointer: 1",
            &format!("RequirementPointer: {pointer}"),
        );
    write(dir, MASTER, &master);
}

fn write_config(dir: &TempDir, yaml: &str) {
    write(dir, ".dw4/config.yaml", yaml);
}

fn git(dir: &Path, args: &[&str]) {
    let status = std::process::Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_CONFIG_GLOBAL", "/dev/null")
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("GIT_AUTHOR_NAME", "dw4")
        .env("GIT_AUTHOR_EMAIL", "dw4@example.com")
        .env("GIT_COMMITTER_NAME", "dw4")
        .env("GIT_COMMITTER_EMAIL", "dw4@example.com")
        .output()
        .unwrap()
        .status;
    assert!(status.success(), "git {args:?} failed");
}

fn git_available() -> bool {
    std::process::Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// dw4 init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_workflow_documents() {
    let dir = TempDir::new().unwrap();
    dw4(&dir).arg("init").assert().success();

    assert!(dir.path().join(".dw4/config.yaml").exists());
    assert!(dir.path().join(MASTER).exists());
    assert!(dir.path().join(REQUIREMENTS).exists());
    assert!(dir.path().join(APPROVALS).exists());
    assert!(dir.path().join("deliverables/plan").is_dir());
    assert!(read(&dir, MASTER).contains("CurrentStage: Engineer"));
    assert!(read(&dir, ".gitignore").contains(".last_commit_sha"));
}

#[test]
fn init_is_idempotent_and_keeps_state() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    set_stage(&dir, "Validator", 4);
    let before = read(&dir, MASTER);

    dw4(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("exists:"));
    assert_eq!(read(&dir, MASTER), before);
}

// ---------------------------------------------------------------------------
// dw4 status
// ---------------------------------------------------------------------------

#[test]
fn status_without_master_file_fails() {
    let dir = TempDir::new().unwrap();
    dw4(&dir)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("dw4 init"));
}

#[test]
fn status_reports_stage_and_deliverable() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    dw4(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("CURRENT STAGE: Engineer"))
        .stdout(predicate::str::contains("deliverables/plan/PLAN.md"));
}

#[test]
fn status_json() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let output = dw4(&dir).args(["status", "--json"]).output().unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["stage"], "Engineer");
    assert_eq!(json["next_stage"], "Researcher");
    assert_eq!(json["requirement_pointer"], 1);
    assert_eq!(json["ready"], false);
}

#[test]
fn validator_status_runs_configured_tests() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    set_stage(&dir, "Validator", 1);

    write_config(&dir, "validation:\n  command: \"true\"\n");
    dw4(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("VALIDATION PASSED"));

    write_config(&dir, "validation:\n  command: \"exit 2\"\n");
    dw4(&dir)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("test runner failed"));
}

// ---------------------------------------------------------------------------
// dw4 approve / advance
// ---------------------------------------------------------------------------

#[test]
fn approve_without_plan_fails_and_leaves_state() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    set_stage(&dir, "Engineer", 3);
    let before = read(&dir, MASTER);

    dw4(&dir)
        .arg("approve")
        .assert()
        .failure()
        .stderr(predicate::str::contains("PLAN.md"));
    assert_eq!(read(&dir, MASTER), before);
}

#[test]
fn approve_with_plan_advances_to_researcher() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    write(&dir, "deliverables/plan/PLAN.md", "# Plan\n");

    dw4(&dir)
        .arg("approve")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Current stage is now: Researcher",
        ));

    let master = read(&dir, MASTER);
    assert!(master.contains("CurrentStage: Researcher  # Engineer, Researcher"));
    assert!(master.contains("- [x] Engineer"));
    assert!(master.contains("- [ ] Researcher"));
}

#[test]
fn advance_rejects_skipping_a_stage() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    write(&dir, "deliverables/plan/PLAN.md", "# Plan\n");
    let before = read(&dir, MASTER);

    dw4(&dir)
        .args(["advance", "Coder"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid transition"));
    dw4(&dir)
        .args(["advance", "Tester"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown stage"));
    assert_eq!(read(&dir, MASTER), before);

    dw4(&dir)
        .args(["advance", "researcher"])
        .assert()
        .success();
    assert!(read(&dir, MASTER).contains("CurrentStage: Researcher"));
}

#[test]
fn deployer_approval_completes_requirement_cycle() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    write_config(&dir, "git:\n  push: false\n");
    set_stage(&dir, "Deployer", 7);
    write(&dir, "deliverables/deployment/DEPLOYMENT.md", "shipped\n");
    write(
        &dir,
        REQUIREMENTS,
        "# Project Requirements\n\n\
         - [x] **ID 6** – Sign in\n\
         - [ ] **ID 7** – Password reset\n\
         - [ ] **ID 8** – Rate limiting\n",
    );

    dw4(&dir)
        .arg("approve")
        .assert()
        .success()
        .stdout(predicate::str::contains("Advanced to next requirement: 8"))
        .stdout(predicate::str::contains("Current stage is now: Engineer"));

    let master = read(&dir, MASTER);
    assert!(master.contains("CurrentStage: Engineer"));
    assert!(master.contains("RequirementPointer: 8"));
    assert_eq!(
        read(&dir, REQUIREMENTS),
        "# Project Requirements\n\n\
         - [x] **ID 6** – Sign in\n\
         - [x] **ID 7** – Password reset\n\
         - [ ] **ID 8** – Rate limiting\n"
    );
    let approvals = read(&dir, APPROVALS);
    assert_eq!(approvals.lines().count(), 1);
    assert!(approvals.starts_with("Requirement 7 approved at "));
    assert!(approvals.trim_end().ends_with(" UTC"));
}

#[test]
fn coder_stage_follows_commits() {
    if !git_available() {
        return;
    }
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    set_stage(&dir, "Coder", 2);

    // First look establishes the baseline (and the repository).
    for _ in 0..2 {
        dw4(&dir)
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("no new commits detected"));
    }
    dw4(&dir)
        .arg("approve")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no new commits"));

    write(&dir, "src/lib.rs", "pub fn answer() -> u32 { 42 }\n");
    git(dir.path(), &["add", "."]);
    git(dir.path(), &["commit", "-q", "-m", "work"]);

    dw4(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("ready for approval"));

    dw4(&dir)
        .arg("approve")
        .assert()
        .success()
        .stdout(predicate::str::contains("No new commit created"))
        .stdout(predicate::str::contains("Current stage is now: Validator"));
}

// ---------------------------------------------------------------------------
// dw4 config
// ---------------------------------------------------------------------------

#[test]
fn config_validate_defaults_are_clean() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    dw4(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No warnings"));
}

#[test]
fn config_validate_fails_on_empty_validation_command() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "validation:\n  command: \"\"\n");

    dw4(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("validation.command is empty"));
}
