// src/tools/mod.rs

//! External collaborators of a run.
//!
//! The runner never executes notebooks, installs packages, or renders HTML
//! itself. It drives these traits; production uses the Python-backed
//! implementations below, tests plug in fakes.

use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::request::ExecutionRequest;

pub mod nbconvert;
pub mod papermill;
pub mod pip;
mod process;

pub use nbconvert::NbconvertConverter;
pub use papermill::PapermillExecutor;
pub use pip::PipInstaller;

/// Makes the notebook tooling available before anything runs.
#[async_trait]
pub trait PackageInstaller: Send + Sync {
    async fn install(&self) -> Result<()>;
}

/// Executes one notebook, writing the result to `request.output_path()`.
///
/// The error message is surfaced as-is; it is never interpreted.
#[async_trait]
pub trait NotebookExecutor: Send + Sync {
    async fn execute(&self, request: &ExecutionRequest) -> Result<()>;
}

/// Renders an executed notebook as HTML and returns the HTML path.
#[async_trait]
pub trait HtmlConverter: Send + Sync {
    async fn convert(&self, notebook: &Path) -> Result<PathBuf>;
}

/// The set of collaborators one run needs.
pub struct Toolchain {
    pub installer: Box<dyn PackageInstaller>,
    pub executor: Arc<dyn NotebookExecutor>,
    pub converter: Box<dyn HtmlConverter>,
}
