// src/runner.rs

//! End-to-end flow of one CI run.
//!
//! setup (layout, secrets, install, request, parameters file)
//!   -> orchestrate (execute + optional watch)
//!   -> convert to HTML (only after a successful execution)
//!   -> report the execution URL (whatever the outcome)
//!   -> remove the secrets file

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::artifact::{execution_url, url_line};
use crate::cli::Cli;
use crate::engine::{run_execution, EventSink};
use crate::errors::RunnerError;
use crate::layout::Layout;
use crate::request::{load_user_parameters, merge_parameters, ExecutionRequest, InjectedParameters};
use crate::settings::Settings;
use crate::sinks::StdoutEventSink;
use crate::tools::papermill::write_parameters_file;
use crate::tools::{NbconvertConverter, PapermillExecutor, PipInstaller, Toolchain};

/// Outcome of a run that got past setup.
#[derive(Debug)]
pub struct RunReport {
    pub execution: Result<(), RunnerError>,

    /// `None` when conversion was not attempted (failed execution).
    pub conversion: Option<Result<PathBuf, RunnerError>>,

    pub execution_url: Option<String>,
}

impl RunReport {
    pub fn html_path(&self) -> Option<&PathBuf> {
        match &self.conversion {
            Some(Ok(path)) => Some(path),
            _ => None,
        }
    }

    /// The failure that decides the exit status: execution first, then
    /// conversion.
    pub fn failure(&self) -> Option<&RunnerError> {
        if let Err(e) = &self.execution {
            return Some(e);
        }
        match &self.conversion {
            Some(Err(e)) => Some(e),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure().is_none()
    }

    pub fn into_result(self) -> Result<(), RunnerError> {
        match self.failure() {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

/// Entry point from `main.rs`.
pub async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::from_cli(cli).map_err(RunnerError::setup)?;
    let layout = settings.layout();
    let tools = python_toolchain(&settings, &layout);

    let report = run_with(&settings, &layout, tools, Arc::new(StdoutEventSink::new())).await?;
    report.into_result()?;
    Ok(())
}

/// The production collaborators, all driven through the configured Python.
pub fn python_toolchain(settings: &Settings, layout: &Layout) -> Toolchain {
    let python = settings.config.runtime.python.clone();

    let executor = PapermillExecutor {
        python: python.clone(),
        engine: settings.config.execution.engine.clone(),
        log_output: settings.config.execution.log_output,
        parameters_file: layout.parameters_file(),
        env: settings.secrets.forwarded_env(),
        progress_log: layout.progress_log.clone(),
        echo: !settings.poll,
    };

    Toolchain {
        installer: Box::new(PipInstaller::new(
            python.clone(),
            settings.config.install.packages.clone(),
        )),
        executor: Arc::new(executor),
        converter: Box::new(NbconvertConverter::new(python)),
    }
}

/// Run with explicit collaborators.
///
/// `Err` only for setup failures; execution and conversion outcomes are
/// carried in the returned report.
pub async fn run_with(
    settings: &Settings,
    layout: &Layout,
    tools: Toolchain,
    sink: Arc<dyn EventSink>,
) -> Result<RunReport, RunnerError> {
    layout.prepare().map_err(RunnerError::setup)?;
    layout
        .write_secrets(&settings.secrets)
        .map_err(RunnerError::setup)?;

    let outcome = run_stages(settings, layout, tools, sink).await;

    if settings.keep_secrets {
        info!(path = %layout.secrets_path.display(), "keeping secrets file");
    } else if let Err(e) = layout.remove_secrets() {
        warn!(error = %e, "failed to remove secrets file");
    }

    outcome
}

async fn run_stages(
    settings: &Settings,
    layout: &Layout,
    tools: Toolchain,
    sink: Arc<dyn EventSink>,
) -> Result<RunReport, RunnerError> {
    let repository = settings
        .github
        .field("repository")
        .and_then(|v| v.as_str())
        .unwrap_or("<unknown>");
    info!(
        repository,
        notebook = %settings.notebook.display(),
        poll = settings.poll,
        "starting notebook run"
    );

    if !settings.secrets.forwarded_env().contains_key("NOTEABLE_TOKEN") {
        warn!("NOTEABLE_TOKEN secret is not set; remote execution will likely fail");
    }

    // ---- install ----
    if settings.config.install.enabled {
        tools.installer.install().await.map_err(RunnerError::setup)?;
    } else {
        info!("package installation skipped");
    }

    // ---- request ----
    let request = build_request(settings, layout).map_err(RunnerError::setup)?;
    write_parameters_file(&layout.parameters_file(), request.parameters())
        .map_err(RunnerError::setup)?;
    let output_notebook = request.output_path().to_path_buf();

    // ---- orchestrate ----
    let execution = run_execution(
        request,
        Arc::clone(&tools.executor),
        settings.watch_options(layout),
        sink,
    )
    .await;

    // ---- convert ----
    let conversion = if execution.is_ok() {
        let converted = tools
            .converter
            .convert(&output_notebook)
            .await
            .map_err(|e| RunnerError::Conversion(format!("{:#}", e)));

        match &converted {
            Ok(html) => info!(path = %html.display(), "HTML rendering written"),
            Err(e) => error!(error = %e, "HTML conversion failed"),
        }
        Some(converted)
    } else {
        None
    };

    // ---- execution URL ----
    let url = execution_url(&output_notebook);
    if let Some(url) = &url {
        println!("{}", url_line(url));
    }

    Ok(RunReport {
        execution,
        conversion,
        execution_url: url,
    })
}

/// Build the request: injected parameters first, user parameters on top.
pub fn build_request(settings: &Settings, layout: &Layout) -> Result<ExecutionRequest> {
    let user = load_user_parameters(settings.params.as_deref())?;

    let parameters = merge_parameters(
        InjectedParameters {
            secrets_path: layout.secrets_path.clone(),
            github: settings.github.raw().clone(),
        },
        user,
    );

    Ok(ExecutionRequest::new(
        settings.notebook.clone(),
        layout.output_notebook(&settings.notebook)?,
        parameters,
        settings.report_mode,
    ))
}
