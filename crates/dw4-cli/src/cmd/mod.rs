pub mod approve;
pub mod config;
pub mod init;
pub mod status;

use anyhow::Context;
use dw4_core::{
    config::Config, engine::Engine, state::WorkflowState, validation::ShellTestRunner,
    vcs::GitCli,
};
use std::path::Path;

/// Everything a workflow command needs, loaded once at command start.
pub struct Session<'r> {
    root: &'r Path,
    config: Config,
    git: GitCli,
    tests: ShellTestRunner,
}

impl<'r> Session<'r> {
    pub fn open(root: &'r Path) -> anyhow::Result<Self> {
        let config = Config::load(root).context("failed to load .dw4/config.yaml")?;
        let git = GitCli::from_config(root, &config);
        let tests = ShellTestRunner::new(config.validation.command.clone());
        Ok(Self {
            root,
            config,
            git,
            tests,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn load_state(&self) -> anyhow::Result<WorkflowState> {
        let path = self.config.master_path(self.root);
        WorkflowState::load(&path).context("failed to load workflow state")
    }

    pub fn engine(&self) -> Engine<'_> {
        Engine::new(self.root, &self.config, &self.git, &self.tests)
    }
}
