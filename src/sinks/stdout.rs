use std::io::Write;
use tracing::{debug, info};

use crate::engine::events::{ExecutionEvent, ExecutionEventKind};
use crate::engine::sink::EventSink;

pub const POLL_START_MARKER: &str = "***Polling latest output status result***";
pub const POLL_END_MARKER: &str = "***End of polling latest output status result***";

/// Production sink: progress polls go to STDOUT as one bracketed block,
/// every other event becomes a log line on STDERR.
#[derive(Debug, Default)]
pub struct StdoutEventSink;

impl StdoutEventSink {
    pub fn new() -> Self {
        Self
    }
}

/// Render one poll as the block written to STDOUT.
pub fn render_poll(lines: &[String]) -> String {
    let mut out = String::new();
    out.push_str(POLL_START_MARKER);
    out.push('\n');
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(POLL_END_MARKER);
    out.push('\n');
    out
}

impl EventSink for StdoutEventSink {
    fn emit(&self, event: ExecutionEvent) {
        let id = &event.execution_id;
        match &event.kind {
            ExecutionEventKind::ProgressPolled { lines } => {
                // One locked write so the block is never interleaved.
                let mut stdout = std::io::stdout().lock();
                let _ = stdout.write_all(render_poll(lines).as_bytes());
                let _ = stdout.flush();
            }
            ExecutionEventKind::ExecutionStarted => info!(execution_id = %id, "execution started"),
            ExecutionEventKind::ExecutionFinished { ok } => {
                info!(execution_id = %id, ok, "execution finished")
            }
            // Already on STDERR from the orchestrator and as the `::error::` line.
            ExecutionEventKind::ExecutionFailed { message } => {
                debug!(execution_id = %id, %message, "execution failed")
            }
            ExecutionEventKind::WatchStarted => debug!(execution_id = %id, "watch started"),
            ExecutionEventKind::WatchStopped => debug!(execution_id = %id, "watch stopped"),
        }
    }
}
