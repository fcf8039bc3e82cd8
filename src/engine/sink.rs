use crate::engine::events::ExecutionEvent;

/// Receives orchestration events from both the execute and the watch task,
/// hence `&self` and `Sync`.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ExecutionEvent);
}
