// src/engine/watch.rs

//! Progress watch task.
//!
//! Sleeps for one interval, then emits the tail of the progress log, until
//! the completion signal is observed. Reading the log is best-effort: a
//! failed read is logged and the loop carries on.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::engine::events::{ExecutionEvent, ExecutionEventKind};
use crate::engine::signal::CompletionSignal;
use crate::engine::sink::EventSink;
use crate::execution_id::ExecutionId;
use crate::util::tail_lines;

#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// When false no watch task is created at all.
    pub enabled: bool,

    pub interval: Duration,

    /// Number of trailing log lines emitted per poll.
    pub tail_lines: usize,

    pub progress_log: PathBuf,
}

pub async fn watch_progress(
    options: WatchOptions,
    signal: CompletionSignal,
    execution_id: ExecutionId,
    sink: Arc<dyn EventSink>,
) {
    sink.emit(ExecutionEvent::new(&execution_id, ExecutionEventKind::WatchStarted));

    while !signal.is_set() {
        tokio::select! {
            _ = tokio::time::sleep(options.interval) => {}
            _ = signal.wait() => break,
        }

        if signal.is_set() {
            break;
        }

        match tail_lines(&options.progress_log, options.tail_lines) {
            Ok(lines) => {
                debug!(
                    execution_id = %execution_id,
                    lines = lines.len(),
                    "polled progress log"
                );
                sink.emit(ExecutionEvent::new(
                    &execution_id,
                    ExecutionEventKind::ProgressPolled { lines },
                ));
            }
            Err(e) => {
                warn!(
                    execution_id = %execution_id,
                    path = %options.progress_log.display(),
                    error = %e,
                    "failed to read progress log"
                );
            }
        }
    }

    sink.emit(ExecutionEvent::new(&execution_id, ExecutionEventKind::WatchStopped));
}
