// src/settings.rs

//! Everything a run needs, parsed and validated once.
//!
//! Built from the CLI (flags / env), the optional config file, and the three
//! CI contexts. After this point nothing reads the process environment.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Cli;
use crate::config::Config;
use crate::context::{GithubContext, RunnerContext, Secrets};
use crate::engine::WatchOptions;
use crate::layout::Layout;
use crate::util::parse_flag;

#[derive(Debug, Clone)]
pub struct Settings {
    pub notebook: PathBuf,
    pub params: Option<PathBuf>,
    pub report_mode: bool,
    pub poll: bool,
    pub keep_secrets: bool,
    pub config: Config,
    pub runner: RunnerContext,
    pub github: GithubContext,
    pub secrets: Secrets,
}

impl Settings {
    pub fn from_cli(cli: Cli) -> Result<Self> {
        if cli.notebook.as_os_str().is_empty() {
            bail!("Input `notebook` is required");
        }

        let report_mode = parse_flag(&cli.is_report).context("Invalid `isReport` input")?;
        let poll = parse_flag(&cli.poll).context("Invalid `poll` input")?;

        let runner = RunnerContext::parse(&cli.runner_context)?;
        let github = GithubContext::parse(&cli.github_context)?;
        let secrets = Secrets::parse(&cli.secrets)?;

        let mut config = Config::load_or_default(&cli.config)?;

        // CLI overrides
        if let Some(secs) = cli.poll_interval {
            config.watch.interval_secs = secs;
        }
        if let Some(n) = cli.tail_lines {
            config.watch.tail_lines = n;
        }
        if let Some(engine) = cli.engine {
            config.execution.engine = engine;
        }
        if let Some(python) = cli.python {
            config.runtime.python = python;
        }
        if cli.skip_install {
            config.install.enabled = false;
        }
        config.validate()?;

        Ok(Self {
            notebook: cli.notebook,
            params: cli.params,
            report_mode,
            poll,
            keep_secrets: cli.keep_secrets,
            config,
            runner,
            github,
            secrets,
        })
    }

    pub fn layout(&self) -> Layout {
        Layout::new(&self.runner, &self.github)
    }

    pub fn watch_options(&self, layout: &Layout) -> WatchOptions {
        WatchOptions {
            enabled: self.poll,
            interval: Duration::from_secs(self.config.watch.interval_secs),
            tail_lines: self.config.watch.tail_lines,
            progress_log: layout.progress_log.clone(),
        }
    }
}
