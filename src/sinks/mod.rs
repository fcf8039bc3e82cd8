pub mod collecting;
pub mod stdout;

pub use collecting::CollectingEventSink;
pub use stdout::StdoutEventSink;
