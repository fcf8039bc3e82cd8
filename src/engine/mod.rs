pub mod events;
pub mod run;
pub mod signal;
pub mod sink;
pub mod watch;

pub use run::run_execution;
pub use signal::{CompletionGuard, CompletionSignal};
pub use sink::EventSink;
pub use watch::WatchOptions;
