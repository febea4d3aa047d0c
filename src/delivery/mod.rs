//! Asynchronous Delivery Component
//!
//! Connects producers to sinks through a [`crate::queue::BoundedQueue`] and a
//! single worker thread per handler.
//!
//! # Overview
//!
//! - **Non-blocking admission**: producers only take the queue lock
//! - **Batched delivery**: the worker hands up to `batch_size` messages to
//!   every sink per iteration, in admission order
//! - **Flush barrier**: [`AsyncHandler::flush`] waits until everything admitted
//!   before the call has reached every sink, then the sinks flush
//! - **Cooperative shutdown**: disabling the queue makes the worker drain,
//!   emit a final drop summary and shut its sinks down
//!
//! # Example Usage
//!
//! ```rust
//! use logpump::delivery::sinks::MemorySink;
//! use logpump::delivery::{AsyncHandler, HandlerConfig, SinkHandle};
//! use logpump::queue::{Message, MessageType};
//! use std::sync::Arc;
//!
//! let memory = Arc::new(MemorySink::new("memory"));
//! let sinks: Vec<SinkHandle> = vec![memory.clone()];
//! let handler = AsyncHandler::new(HandlerConfig::named("example"), sinks).unwrap();
//!
//! handler.handle_message_batch(vec![
//!     Message::new("svc", MessageType::Info, "one"),
//!     Message::new("svc", MessageType::Info, "two"),
//! ]);
//! handler.shutdown();
//!
//! assert_eq!(memory.texts(), vec!["one", "two"]);
//! assert!(memory.is_shut_down());
//! ```

pub mod api;
mod barrier;
mod config;
mod error;
mod handler;
mod sink;
pub mod sinks;
mod worker;

pub use barrier::FlushBarrier;
pub use config::{HandlerConfig, DEFAULT_BATCH_SIZE, DEFAULT_FLUSH_POLL_MS, DEFAULT_IDLE_WAIT_MS};
pub use error::{HandlerError, HandlerResult, SinkError, SinkResult};
pub use handler::{AsyncHandler, HandlerStats};
pub use sink::{aggregate_type_mask, any_records_source_location, Sink, SinkConfig, SinkHandle};
pub use worker::WorkerPhase;

#[cfg(test)]
mod tests;
