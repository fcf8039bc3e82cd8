// src/engine/run.rs

//! Run-and-watch orchestration.
//!
//! Task A executes the notebook and releases the completion signal when it
//! exits, however it exits. Task B (optional) polls the progress log until it
//! sees that signal. Both run on the tokio runtime with no ordering between
//! them; failures are collected in completion order and the first one wins.

use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, info_span, warn, Instrument};

use crate::engine::events::{ExecutionEvent, ExecutionEventKind};
use crate::engine::signal::CompletionSignal;
use crate::engine::sink::EventSink;
use crate::engine::watch::{watch_progress, WatchOptions};
use crate::errors::RunnerError;
use crate::execution_id::ExecutionId;
use crate::request::ExecutionRequest;
use crate::tools::NotebookExecutor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskKind {
    Execute,
    Watch,
}

impl TaskKind {
    fn panicked(self, message: String) -> RunnerError {
        match self {
            TaskKind::Execute => RunnerError::Execution(format!("task panicked: {}", message)),
            TaskKind::Watch => RunnerError::Watch(format!("task panicked: {}", message)),
        }
    }
}

/// Execute `request` and, when enabled, watch its progress log meanwhile.
///
/// Returns the first failure observed across both tasks. The first failure
/// is also written to stderr; any later one is logged.
pub async fn run_execution(
    request: ExecutionRequest,
    executor: Arc<dyn NotebookExecutor>,
    watch: WatchOptions,
    sink: Arc<dyn EventSink>,
) -> Result<(), RunnerError> {
    let execution_id = ExecutionId::new();
    let span = info_span!("execution", execution_id = %execution_id);

    async move {
        let signal = CompletionSignal::new();
        let mut tasks: JoinSet<Result<(), RunnerError>> = JoinSet::new();

        info!(
            input = %request.input_path().display(),
            output = %request.output_path().display(),
            report_mode = request.report_mode(),
            watch = watch.enabled,
            "starting notebook execution"
        );

        tasks.spawn(
            supervised(
                TaskKind::Execute,
                execute_notebook(
                    request,
                    executor,
                    signal.clone(),
                    execution_id.clone(),
                    Arc::clone(&sink),
                ),
            )
            .in_current_span(),
        );

        if watch.enabled {
            let watcher = watch_progress(
                watch,
                signal.clone(),
                execution_id.clone(),
                Arc::clone(&sink),
            );
            tasks.spawn(
                supervised(TaskKind::Watch, async move {
                    watcher.await;
                    Ok(())
                })
                .in_current_span(),
            );
        }

        let mut first_failure: Option<RunnerError> = None;

        while let Some(joined) = tasks.join_next().await {
            let outcome = joined
                .unwrap_or_else(|e| Err(RunnerError::Execution(format!("task aborted: {}", e))));

            if let Err(err) = outcome {
                if first_failure.is_none() {
                    eprintln!("{}", err);
                    sink.emit(ExecutionEvent::new(
                        &execution_id,
                        ExecutionEventKind::ExecutionFailed {
                            message: err.to_string(),
                        },
                    ));
                    first_failure = Some(err);
                } else {
                    warn!(error = %err, "additional task failure");
                }
            }
        }

        match first_failure {
            Some(err) => Err(err),
            None => {
                info!("notebook execution completed");
                Ok(())
            }
        }
    }
    .instrument(span)
    .await
}

/// Task A. The guard is taken before anything can fail.
async fn execute_notebook(
    request: ExecutionRequest,
    executor: Arc<dyn NotebookExecutor>,
    signal: CompletionSignal,
    execution_id: ExecutionId,
    sink: Arc<dyn EventSink>,
) -> Result<(), RunnerError> {
    let _release = signal.guard();

    sink.emit(ExecutionEvent::new(
        &execution_id,
        ExecutionEventKind::ExecutionStarted,
    ));

    let result = executor
        .execute(&request)
        .await
        .map_err(|e| RunnerError::Execution(format!("{:#}", e)));

    sink.emit(ExecutionEvent::new(
        &execution_id,
        ExecutionEventKind::ExecutionFinished {
            ok: result.is_ok(),
        },
    ));

    result
}

/// Turn a panic inside `fut` into a failure attributed to `kind`.
async fn supervised<F>(kind: TaskKind, fut: F) -> Result<(), RunnerError>
where
    F: Future<Output = Result<(), RunnerError>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(kind.panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
