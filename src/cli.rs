// src/cli.rs

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Execute a notebook with papermill inside a CI job.
///
/// Every input can be given as a flag or through the environment variable
/// the workflow runner sets for it (`INPUT_*` for action inputs, `RUNNER`,
/// `SECRETS` and `GITHUB` for the JSON contexts).
#[derive(Parser, Debug)]
#[command(name = "nb-runner", version)]
pub struct Cli {
    /// Notebook to execute
    #[arg(long, env = "INPUT_NOTEBOOK")]
    pub notebook: PathBuf,

    /// JSON file of notebook parameters
    ///
    /// A missing file is treated as "no parameters".
    #[arg(long, env = "INPUT_PARAMS")]
    pub params: Option<PathBuf>,

    /// Execute in report mode (hide input cells)
    ///
    /// Accepts true/false, yes/no, on/off, 1/0.
    #[arg(long, env = "INPUT_ISREPORT", default_value = "false")]
    pub is_report: String,

    /// Poll the progress log while the notebook runs
    #[arg(long, env = "INPUT_POLL", default_value = "false")]
    pub poll: String,

    /// Runner context as JSON
    #[arg(long, env = "RUNNER", hide_env_values = true)]
    pub runner_context: String,

    /// Secrets map as JSON
    #[arg(long, env = "SECRETS", hide_env_values = true)]
    pub secrets: String,

    /// GitHub context as JSON
    #[arg(long, env = "GITHUB", hide_env_values = true)]
    pub github_context: String,

    /// Path to the optional config file
    #[arg(short, long, default_value = "nb-runner.yaml")]
    pub config: PathBuf,

    /// Override the polling interval in seconds
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Override how many log lines are printed per poll
    #[arg(long)]
    pub tail_lines: Option<usize>,

    /// Override the papermill engine
    #[arg(long)]
    pub engine: Option<String>,

    /// Override the Python binary
    #[arg(long)]
    pub python: Option<String>,

    /// Do not install packages (tooling is already present)
    #[arg(long)]
    pub skip_install: bool,

    /// Keep the secrets file after the run
    #[arg(long)]
    pub keep_secrets: bool,

    /// Log level (falls back to NB_RUNNER_LOG, then info)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}
