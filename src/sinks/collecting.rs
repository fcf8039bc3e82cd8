use std::sync::Mutex;

use crate::engine::events::{ExecutionEvent, ExecutionEventKind};
use crate::engine::sink::EventSink;

/// An in-memory event sink used to collect execution events
/// during a single run.
///
/// Both orchestration tasks emit into it concurrently, so the buffer sits
/// behind a mutex.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: Mutex<Vec<ExecutionEvent>>,
}

impl CollectingEventSink {
    /// Create a new, empty collecting sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all collected events, in emission order.
    pub fn events(&self) -> Vec<ExecutionEvent> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Just the event kinds, which is what most assertions care about.
    pub fn kinds(&self) -> Vec<ExecutionEventKind> {
        self.events().into_iter().map(|e| e.kind).collect()
    }

    /// Number of progress polls seen so far.
    pub fn poll_count(&self) -> usize {
        self.kinds()
            .iter()
            .filter(|k| matches!(k, ExecutionEventKind::ProgressPolled { .. }))
            .count()
    }
}

impl EventSink for CollectingEventSink {
    fn emit(&self, event: ExecutionEvent) {
        match self.events.lock() {
            Ok(mut guard) => guard.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
