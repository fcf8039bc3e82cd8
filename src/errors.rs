// src/errors.rs

//! Failure taxonomy for a notebook run.
//!
//! Each variant maps to one stage of the run so the caller can tell them
//! apart (and decide whether the exit status must be non-zero):
//! - `Setup`: contexts, layout, secrets, installation, parameters file
//! - `Execution`: the notebook execution call failed or its task panicked
//! - `Watch`: the progress watch task panicked
//! - `Conversion`: HTML conversion failed after a successful execution

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunnerError {
    #[error("Setup failed: {0}")]
    Setup(String),

    #[error("Notebook execution failed: {0}")]
    Execution(String),

    #[error("Progress watch failed: {0}")]
    Watch(String),

    #[error("HTML conversion failed: {0}")]
    Conversion(String),
}

impl RunnerError {
    /// Build a `Setup` error from any error chain, keeping every cause.
    pub fn setup(err: impl Into<anyhow::Error>) -> Self {
        RunnerError::Setup(format!("{:#}", err.into()))
    }
}

pub type Result<T> = std::result::Result<T, RunnerError>;
