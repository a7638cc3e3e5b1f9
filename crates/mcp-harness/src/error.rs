//! Harness-side error types.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to set up a run or case directory.
#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("failed to create workspace root under {parent}: {source}")]
    Root {
        parent: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to create case directory for {case} in {root}: {source}")]
    CaseDir {
        case: String,
        root: PathBuf,
        source: std::io::Error,
    },
}

/// A case-level expectation that did not hold.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct AssertionFailure {
    pub message: String,
}

impl AssertionFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
