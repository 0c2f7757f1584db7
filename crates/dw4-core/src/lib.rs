pub mod config;
pub mod deliverable;
pub mod engine;
pub mod error;
pub mod io;
pub mod ledger;
pub mod paths;
pub mod state;
pub mod types;
pub mod validation;
pub mod vcs;

pub use error::{Dw4Error, Result};
