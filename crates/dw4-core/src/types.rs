use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// One of the five phases of the delivery cycle. The cycle has no terminal
/// stage: `Deployer` wraps back to `Engineer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    Engineer,
    Researcher,
    Coder,
    Validator,
    Deployer,
}

impl Stage {
    pub fn all() -> &'static [Stage] {
        &[
            Stage::Engineer,
            Stage::Researcher,
            Stage::Coder,
            Stage::Validator,
            Stage::Deployer,
        ]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// The sequential successor, wrapping from `Deployer` to `Engineer`.
    pub fn next(self) -> Stage {
        let all = Stage::all();
        all[(self.index() + 1) % all.len()]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Engineer => "Engineer",
            Stage::Researcher => "Researcher",
            Stage::Coder => "Coder",
            Stage::Validator => "Validator",
            Stage::Deployer => "Deployer",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = crate::error::Dw4Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::all()
            .iter()
            .copied()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| crate::error::Dw4Error::InvalidStage(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
