// src/tools/papermill.rs

//! Notebook execution through the papermill CLI.
//!
//! Parameters are handed over as a YAML parameters file and every other
//! option as a discrete argument, so nothing is ever interpolated into
//! script or shell text.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::info;

use super::process::{pump, LogFile};
use super::NotebookExecutor;
use crate::request::{ExecutionRequest, Parameters};

/// How many trailing STDERR lines are attached to a failure.
const ERROR_TAIL_LINES: usize = 20;

#[derive(Debug, Clone)]
pub struct PapermillExecutor {
    pub python: String,
    pub engine: String,
    pub log_output: bool,

    /// The YAML parameters file, written by the runner during setup.
    pub parameters_file: PathBuf,

    /// Extra environment for the papermill process (forwarded secrets).
    pub env: BTreeMap<String, String>,

    /// Child output is appended here for the watch task to poll.
    pub progress_log: PathBuf,

    /// Also echo child output to our STDERR (used when nobody polls the log).
    pub echo: bool,
}

impl PapermillExecutor {
    /// The argv passed to `python`, without the environment.
    pub fn args(&self, request: &ExecutionRequest) -> Vec<String> {
        let mut args = vec![
            "-m".to_string(),
            "papermill".to_string(),
            request.input_path().display().to_string(),
            request.output_path().display().to_string(),
            "--parameters_file".to_string(),
            self.parameters_file.display().to_string(),
            "--engine".to_string(),
            self.engine.clone(),
        ];

        args.push(if self.log_output {
            "--log-output".to_string()
        } else {
            "--no-log-output".to_string()
        });
        args.push(if request.report_mode() {
            "--report-mode".to_string()
        } else {
            "--no-report-mode".to_string()
        });

        args
    }
}

/// Write the parameters papermill injects into the notebook.
pub fn write_parameters_file(path: &Path, parameters: &Parameters) -> Result<()> {
    let yaml = serde_yaml::to_string(&Value::Object(parameters.clone()))
        .context("Failed to serialise notebook parameters")?;

    std::fs::write(path, yaml)
        .with_context(|| format!("Failed to write parameters file {:?}", path))
}

#[async_trait]
impl NotebookExecutor for PapermillExecutor {
    async fn execute(&self, request: &ExecutionRequest) -> Result<()> {
        let log = LogFile::create(self.progress_log.clone()).await?;

        let mut cmd = Command::new(&self.python);
        cmd.args(self.args(request))
            .envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        info!(
            engine = %self.engine,
            parameters = request.parameters().len(),
            "spawning papermill"
        );

        let mut child = cmd.spawn().context("Failed to spawn papermill")?;

        let stdout = child.stdout.take().context("papermill stdout not captured")?;
        let stderr = child.stderr.take().context("papermill stderr not captured")?;

        let stdout_pump = tokio::spawn(pump(stdout, Some(log.clone()), self.echo, 0));
        let stderr_pump = tokio::spawn(pump(stderr, Some(log), self.echo, ERROR_TAIL_LINES));

        let status = child
            .wait()
            .await
            .context("Failed while waiting for papermill to complete")?;

        let _ = stdout_pump.await;
        let stderr_tail = stderr_pump.await.unwrap_or_default();

        if !status.success() {
            let detail = last_error_line(&stderr_tail)
                .map(|line| format!(": {}", line))
                .unwrap_or_default();
            bail!(
                "papermill exited with {}{}\n{}",
                status,
                detail,
                stderr_tail.join("\n")
            );
        }

        if !request.output_path().exists() {
            bail!(
                "papermill finished but wrote no notebook at {:?}",
                request.output_path()
            );
        }

        Ok(())
    }
}

/// Python tracebacks end with `SomeError: message`; that line is the summary.
fn last_error_line(lines: &[String]) -> Option<&str> {
    lines
        .iter()
        .rev()
        .map(|l| l.trim())
        .find(|l| !l.is_empty())
}
