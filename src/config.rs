// src/config.rs

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::util::read_to_string;

/// Root configuration loaded from `nb-runner.yaml`.
///
/// Every section is optional. The file controls:
/// - Which Python binary drives papermill / nbconvert / pip
/// - Which papermill engine executes the notebook
/// - How often the progress log is polled
/// - Which packages are installed before the run
///
/// Action inputs (`--poll`, `--skip-install`, ...) only override it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub runtime: Runtime,

    #[serde(default)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub install: InstallConfig,
}

/// Runtime binary configuration.
///
/// Example:
///
/// runtime:
///   python: python3
#[derive(Debug, Clone, Deserialize)]
pub struct Runtime {
    #[serde(default = "default_python")]
    pub python: String,
}

impl Default for Runtime {
    fn default() -> Self {
        Self {
            python: default_python(),
        }
    }
}

fn default_python() -> String {
    "python3".to_string()
}

/// Papermill execution settings.
///
/// execution:
///   engine: noteable
///   log_output: true
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default = "default_engine")]
    pub engine: String,

    #[serde(default = "default_true")]
    pub log_output: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            log_output: true,
        }
    }
}

fn default_engine() -> String {
    "noteable".to_string()
}

fn default_true() -> bool {
    true
}

/// Progress polling settings.
///
/// watch:
///   interval_secs: 15
///   tail_lines: 15
#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    #[serde(default = "default_tail_lines")]
    pub tail_lines: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            tail_lines: default_tail_lines(),
        }
    }
}

fn default_interval_secs() -> u64 {
    15
}

fn default_tail_lines() -> usize {
    15
}

/// Package installation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct InstallConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// pip requirement specifiers installed in a single `pip install`.
    #[serde(default = "default_packages")]
    pub packages: Vec<String>,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            packages: default_packages(),
        }
    }
}

fn default_packages() -> Vec<String> {
    [
        "papermill-origami",
        "papermill>=2.4.0",
        "nbformat>=5.4.0",
        "nbconvert>=7.0.0",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Config {
    /// Load and parse a config file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = read_to_string(path)?;

        let cfg: Config = serde_yaml::from_str(&raw)
            .with_context(|| format!("Failed to parse YAML config {:?}", path))?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Load the config file if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.runtime.python.trim().is_empty() {
            bail!("runtime.python must not be empty");
        }
        if self.execution.engine.trim().is_empty() {
            bail!("execution.engine must not be empty");
        }
        if self.watch.interval_secs == 0 {
            bail!("watch.interval_secs must be greater than zero");
        }
        if self.watch.tail_lines == 0 {
            bail!("watch.tail_lines must be greater than zero");
        }
        Ok(())
    }
}
