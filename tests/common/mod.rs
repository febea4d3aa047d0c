//! Common test utilities and helpers
//!
//! Shared by the integration tests: handler construction over in-memory or
//! file sinks and bounded polling.

#![allow(dead_code)]

use logpump::delivery::api::{AsyncHandler, HandlerConfig, MemorySink, SinkHandle};
use logpump::queue::{Message, MessageType};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Handler over a single memory sink
pub fn memory_handler(config: HandlerConfig) -> (AsyncHandler, Arc<MemorySink>) {
    memory_handler_with(config, MemorySink::new("memory"))
}

pub fn memory_handler_with(config: HandlerConfig, sink: MemorySink) -> (AsyncHandler, Arc<MemorySink>) {
    let sink = Arc::new(sink);
    let sinks: Vec<SinkHandle> = vec![sink.clone()];
    let handler = AsyncHandler::new(config, sinks).expect("handler should start");
    (handler, sink)
}

pub fn info(source: &str, text: impl Into<String>) -> Message {
    Message::new(source, MessageType::Info, text)
}

/// Poll `condition` for up to five seconds
pub fn wait_until<F: Fn() -> bool>(condition: F) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}
