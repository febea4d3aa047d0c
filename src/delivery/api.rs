//! Public API for the delivery system
//!
//! External modules should import from here rather than directly from internal modules.

// Handler and lifecycle
pub use crate::delivery::handler::{AsyncHandler, HandlerStats};
pub use crate::delivery::worker::WorkerPhase;

// Configuration
pub use crate::delivery::config::HandlerConfig;

// Sink contract and reference sinks
pub use crate::delivery::sink::{Sink, SinkConfig, SinkHandle};
pub use crate::delivery::sinks::{ConsoleSink, ConsoleTarget, FileSink, MemorySink, MessageFormat};

// Error handling
pub use crate::delivery::error::{HandlerError, HandlerResult, SinkError, SinkResult};
