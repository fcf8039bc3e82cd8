use crate::execution_id::ExecutionId;
use std::time::SystemTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionEventKind {
    ExecutionStarted,
    ExecutionFinished { ok: bool },
    ExecutionFailed { message: String },
    WatchStarted,
    /// Last lines of the progress log at one poll.
    ProgressPolled { lines: Vec<String> },
    WatchStopped,
}

#[derive(Debug, Clone)]
pub struct ExecutionEvent {
    pub execution_id: ExecutionId,
    pub kind: ExecutionEventKind,
    pub timestamp: SystemTime,
}

impl ExecutionEvent {
    pub fn new(execution_id: &ExecutionId, kind: ExecutionEventKind) -> Self {
        Self {
            execution_id: execution_id.clone(),
            kind,
            timestamp: SystemTime::now(),
        }
    }
}
