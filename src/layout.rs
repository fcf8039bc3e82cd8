// src/layout.rs

//! Filesystem layout derived from the runner and GitHub contexts.
//!
//! <temp>/nb-runner/<notebook name>        executed notebook (+ .html)
//! <temp>/nb-runner-scripts/               generated papermill parameters
//! <temp>/secrets.json                     dump of the secrets map
//! <workspace>/papermill-nb-runner.out     progress log polled by the watcher

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::context::{GithubContext, RunnerContext, Secrets};
use crate::util::ensure_dir;

pub const OUTPUT_DIR: &str = "nb-runner";
pub const SCRIPTS_DIR: &str = "nb-runner-scripts";
pub const PARAMETERS_FILE: &str = "nb-runner-params.yaml";
pub const SECRETS_FILE: &str = "secrets.json";
pub const PROGRESS_LOG: &str = "papermill-nb-runner.out";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub output_dir: PathBuf,
    pub scripts_dir: PathBuf,
    pub secrets_path: PathBuf,
    pub progress_log: PathBuf,
}

impl Layout {
    pub fn new(runner: &RunnerContext, github: &GithubContext) -> Self {
        Self {
            output_dir: runner.temp.join(OUTPUT_DIR),
            scripts_dir: runner.temp.join(SCRIPTS_DIR),
            secrets_path: runner.temp.join(SECRETS_FILE),
            progress_log: github.workspace().join(PROGRESS_LOG),
        }
    }

    /// Create the output and scripts directories.
    pub fn prepare(&self) -> Result<()> {
        ensure_dir(&self.output_dir)?;
        ensure_dir(&self.scripts_dir)?;
        Ok(())
    }

    /// Where the executed copy of `notebook` is written.
    pub fn output_notebook(&self, notebook: &Path) -> Result<PathBuf> {
        let name = notebook
            .file_name()
            .with_context(|| format!("Notebook path has no file name: {:?}", notebook))?;
        Ok(self.output_dir.join(name))
    }

    pub fn parameters_file(&self) -> PathBuf {
        self.scripts_dir.join(PARAMETERS_FILE)
    }

    /// Dump the secrets map so the notebook can read it via `secretsPath`.
    ///
    /// The file is owner-only on Unix; the caller removes it after the run.
    pub fn write_secrets(&self, secrets: &Secrets) -> Result<()> {
        let bytes = secrets.to_json()?;
        write_private(&self.secrets_path, &bytes)
            .with_context(|| format!("Failed to write secrets file {:?}", self.secrets_path))
    }

    pub fn remove_secrets(&self) -> Result<()> {
        match std::fs::remove_file(&self.secrets_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove secrets file {:?}", self.secrets_path)),
        }
    }
}

#[cfg(unix)]
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(bytes)
}

#[cfg(not(unix))]
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, bytes)
}
