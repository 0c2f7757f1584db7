use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Dw4Error {
    #[error("workflow master file not found at {}: run 'dw4 init'", .0.display())]
    NotInitialized(PathBuf),

    #[error("invalid workflow state: {0}")]
    InvalidState(String),

    #[error("invalid stage '{0}': must be one of Engineer, Researcher, Coder, Validator, Deployer")]
    InvalidStage(String),

    #[error("invalid transition from {from} to {to}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    #[error("deliverable missing for stage '{stage}': {detail}")]
    DeliverableMissing { stage: String, detail: String },

    #[error("{tool} failed: {detail}")]
    ExternalTool { tool: String, detail: String },

    #[error("required tool '{0}' not found on PATH")]
    ToolNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Dw4Error>;
