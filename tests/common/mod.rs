#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

use nb_runner::request::ExecutionRequest;
use nb_runner::tools::{HtmlConverter, NotebookExecutor, PackageInstaller};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// Logs are captured per test and only shown for failures
/// (or with `-- --nocapture`). Enable levels with `RUST_LOG=debug`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt().with_env_filter(filter).with_test_writer().init();
    });
}

/// What the fake executor does when called.
#[derive(Debug, Clone)]
pub enum Behaviour {
    /// Sleep, then write an output notebook with the given metadata.
    Succeed {
        after: Duration,
        metadata: serde_json::Value,
    },
    /// Sleep, then fail with the given message.
    Fail { after: Duration, message: String },
    /// Sleep, then panic.
    Panic { after: Duration },
}

/// Records every request it receives and behaves as scripted.
pub struct FakeExecutor {
    behaviour: Behaviour,
    pub requests: Mutex<Vec<ExecutionRequest>>,
    /// Lines appended to this file while "executing", like papermill's log.
    progress_log: Option<PathBuf>,
}

impl FakeExecutor {
    pub fn new(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            requests: Mutex::new(Vec::new()),
            progress_log: None,
        }
    }

    pub fn with_progress_log(mut self, path: PathBuf) -> Self {
        self.progress_log = Some(path);
        self
    }

    pub fn succeeding(after: Duration) -> Self {
        Self::new(Behaviour::Succeed {
            after,
            metadata: serde_json::json!({}),
        })
    }

    pub fn last_request(&self) -> ExecutionRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("executor was never called")
    }
}

#[async_trait]
impl NotebookExecutor for FakeExecutor {
    async fn execute(&self, request: &ExecutionRequest) -> Result<()> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(log) = &self.progress_log {
            std::fs::write(log, "Executing cell 1\nExecuting cell 2\n")?;
        }

        match &self.behaviour {
            Behaviour::Succeed { after, metadata } => {
                tokio::time::sleep(*after).await;
                write_notebook(request.output_path(), metadata.clone());
                Ok(())
            }
            Behaviour::Fail { after, message } => {
                tokio::time::sleep(*after).await;
                Err(anyhow!(message.clone()))
            }
            Behaviour::Panic { after } => {
                tokio::time::sleep(*after).await;
                panic!("kernel died unexpectedly");
            }
        }
    }
}

pub fn write_notebook(path: &Path, metadata: serde_json::Value) {
    let nb = serde_json::json!({
        "cells": [],
        "metadata": metadata,
        "nbformat": 4,
        "nbformat_minor": 5
    });
    std::fs::write(path, nb.to_string()).unwrap();
}

#[derive(Default)]
pub struct FakeInstaller {
    pub calls: AtomicUsize,
    pub fail: bool,
}

#[async_trait]
impl PackageInstaller for FakeInstaller {
    async fn install(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(anyhow!("pip install exited with exit status: 1"));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeConverter {
    pub calls: AtomicUsize,
    pub fail: bool,
}

#[async_trait]
impl HtmlConverter for FakeConverter {
    async fn convert(&self, notebook: &Path) -> Result<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(anyhow!("nbconvert exited with exit status: 1"));
        }
        let html = notebook.with_extension("html");
        std::fs::write(&html, "<html></html>")?;
        Ok(html)
    }
}

/// Shares a fake between the toolchain (which takes ownership) and the test.
pub struct Shared<T>(pub Arc<T>);

#[async_trait]
impl<T: PackageInstaller> PackageInstaller for Shared<T> {
    async fn install(&self) -> Result<()> {
        self.0.install().await
    }
}

#[async_trait]
impl<T: HtmlConverter> HtmlConverter for Shared<T> {
    async fn convert(&self, notebook: &Path) -> Result<PathBuf> {
        self.0.convert(notebook).await
    }
}
