//! The stage-transition engine.
//!
//! `approve` runs a fixed sequence with fail-fast gates:
//!
//! 1. deliverable gate for the current stage
//! 2. edge side effects (Coder → Validator commit; Deployer → Engineer push
//!    and requirement-cycle completion)
//! 3. stage/pointer/checklist update and a single save of the master file
//! 4. fresh baseline when entering Coder
//!
//! Nothing is written to the master file before step 3, so a failure in
//! steps 1–2 leaves it untouched. Side effects already applied by step 2
//! (a commit, an approval-log line) are not rolled back.

use crate::config::Config;
use crate::deliverable::{DeliverableChecker, DeliverableStatus};
use crate::error::{Dw4Error, Result};
use crate::ledger::RequirementLedger;
use crate::state::{ChecklistEntry, WorkflowState};
use crate::types::Stage;
use crate::validation::{TestOutcome, TestRunner};
use crate::vcs::{CommitResult, PushOutcome, VersionControl};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub stage: Stage,
    pub next_stage: Stage,
    pub requirement_pointer: u64,
    pub checklist: Vec<ChecklistEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deliverable: Option<DeliverableStatus>,
    /// Coder only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_commits: Option<bool>,
    /// Validator only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<TestOutcome>,
    /// Whether `approve` would pass its gate right now.
    pub ready: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleCompletion {
    pub requirement: u64,
    pub approved_at: DateTime<Utc>,
    pub checked_off: bool,
    pub next_requirement: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transition {
    pub from: Stage,
    pub to: Stage,
    pub requirement_pointer: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<CommitResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push: Option<PushOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle: Option<CycleCompletion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<String>,
    pub checklist_updated: bool,
}

pub fn commit_message(requirement: u64) -> String {
    format!("feat(req-{requirement}): Coder stage submission for requirement {requirement}")
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct Engine<'a> {
    root: &'a Path,
    config: &'a Config,
    vcs: &'a dyn VersionControl,
    tests: &'a dyn TestRunner,
    clock: fn() -> DateTime<Utc>,
}

impl<'a> Engine<'a> {
    pub fn new(
        root: &'a Path,
        config: &'a Config,
        vcs: &'a dyn VersionControl,
        tests: &'a dyn TestRunner,
    ) -> Self {
        Self {
            root,
            config,
            vcs,
            tests,
            clock: Utc::now,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    fn checker(&self) -> DeliverableChecker<'a> {
        DeliverableChecker::new(self.root, self.config)
    }

    fn ledger(&self) -> RequirementLedger {
        RequirementLedger::from_config(self.root, self.config)
    }

    // -----------------------------------------------------------------------
    // status
    // -----------------------------------------------------------------------

    /// Read-only report on the current stage. Coder may establish a first
    /// baseline; Validator runs the test suite and fails if it fails.
    pub fn status(&self, state: &WorkflowState) -> Result<StatusReport> {
        let stage = state.current_stage()?;
        let requirement_pointer = state.requirement_pointer()?;
        let checker = self.checker();
        let deliverable = checker.status(stage);

        let mut new_commits = None;
        let mut validation = None;
        match stage {
            Stage::Coder => new_commits = Some(self.vcs.has_new_commits()?),
            Stage::Validator => {
                let outcome = self.tests.run(self.root)?;
                if !outcome.passed {
                    return Err(Dw4Error::ExternalTool {
                        tool: "test runner".to_string(),
                        detail: match outcome.exit_code {
                            Some(code) => format!("'{}' exited with {code}", outcome.command),
                            None => format!("'{}' was terminated by a signal", outcome.command),
                        },
                    });
                }
                validation = Some(outcome);
            }
            _ => {}
        }

        let ready = match (new_commits, &deliverable) {
            (Some(commits), _) => commits,
            (None, Some(d)) => d.present,
            (None, None) => true,
        };

        Ok(StatusReport {
            stage,
            next_stage: stage.next(),
            requirement_pointer,
            checklist: state.checklist(),
            deliverable,
            new_commits,
            validation,
            ready,
        })
    }

    // -----------------------------------------------------------------------
    // approve
    // -----------------------------------------------------------------------

    /// Validate the current stage and advance to its successor.
    pub fn approve(&self, state: &mut WorkflowState) -> Result<Transition> {
        let from = state.current_stage()?;
        let pointer = state.requirement_pointer()?;
        let to = from.next();

        // 1. Deliverable gate.
        let checker = self.checker();
        if !checker.is_satisfied(from, self.vcs)? {
            return Err(Dw4Error::DeliverableMissing {
                stage: from.to_string(),
                detail: checker.missing_detail(from),
            });
        }

        // 2. Edge side effects.
        let mut commit = None;
        let mut push = None;
        let mut cycle = None;
        match (from, to) {
            (Stage::Coder, Stage::Validator) => {
                commit = Some(self.vcs.commit_all(&commit_message(pointer))?);
            }
            (Stage::Deployer, Stage::Engineer) => {
                // Before the push and the approval log, so an exhausted
                // pointer leaves nothing half-applied.
                let next_requirement = RequirementLedger::advance_pointer(pointer)?;
                let outcome = if self.config.git.push {
                    self.vcs.push()
                } else {
                    PushOutcome::Skipped
                };
                if let PushOutcome::Failed { diagnostic } = &outcome {
                    tracing::warn!(%diagnostic, "git push failed; continuing");
                }
                push = Some(outcome);
                cycle = Some(self.complete_cycle(pointer, next_requirement)?);
            }
            _ => {}
        }

        // 3. Commit the transition.
        state.set_current_stage(to);
        if let Some(c) = &cycle {
            state.set_requirement_pointer(c.next_requirement);
        }
        let checklist_updated = state.mark_checklist(from);
        state.save()?;
        tracing::info!(%from, %to, "advanced workflow");

        // 4. Entering Coder: measure commits from here on.
        let mut baseline = None;
        if to == Stage::Coder {
            self.vcs.ensure_repository()?;
            baseline = Some(self.vcs.record_baseline()?);
        }

        Ok(Transition {
            from,
            to,
            requirement_pointer: state.requirement_pointer()?,
            commit,
            push,
            cycle,
            baseline,
            checklist_updated,
        })
    }

    /// `approve`, but only if `target` is the sequential successor.
    pub fn advance_to(&self, state: &mut WorkflowState, target: Stage) -> Result<Transition> {
        let from = state.current_stage()?;
        if from.next() != target {
            return Err(Dw4Error::InvalidTransition {
                from: from.to_string(),
                to: target.to_string(),
                reason: format!("the next stage after {from} is {}", from.next()),
            });
        }
        self.approve(state)
    }

    fn complete_cycle(&self, requirement: u64, next_requirement: u64) -> Result<CycleCompletion> {
        let ledger = self.ledger();
        let approved_at = (self.clock)();
        ledger.log_approval(requirement, approved_at)?;
        let checked_off = ledger.check_off_requirement(requirement)?;
        Ok(CycleCompletion {
            requirement,
            approved_at,
            checked_off,
            next_requirement,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
