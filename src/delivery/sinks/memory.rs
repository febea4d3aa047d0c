//! In-memory sink
//!
//! Keeps every delivered message. Used by `--dry-run` and throughout the
//! tests to observe exactly what the worker handed over, and in which batches.

use crate::core::sync::lock_unpoisoned;
use crate::delivery::error::SinkResult;
use crate::delivery::sink::{Sink, SinkConfig};
use crate::queue::{Message, MessageTypeMask};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug)]
pub struct MemorySink {
    name: String,
    config: SinkConfig,
    /// Artificial per-batch latency
    delay: Option<Duration>,
    flush_delay: Option<Duration>,
    /// Messages received when the last flush finished
    flushed_len: AtomicUsize,
    messages: Mutex<Vec<Arc<Message>>>,
    batch_sizes: Mutex<Vec<usize>>,
    flushes: AtomicUsize,
    started: AtomicBool,
    shut_down: AtomicBool,
}

impl MemorySink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: SinkConfig::default(),
            delay: None,
            flush_delay: None,
            flushed_len: AtomicUsize::new(0),
            messages: Mutex::new(Vec::new()),
            batch_sizes: Mutex::new(Vec::new()),
            flushes: AtomicUsize::new(0),
            started: AtomicBool::new(false),
            shut_down: AtomicBool::new(false),
        }
    }

    pub fn with_types(mut self, message_types: MessageTypeMask) -> Self {
        self.config.message_types = message_types;
        self
    }

    pub fn recording_source_location(mut self) -> Self {
        self.config.record_source_location = true;
        self
    }

    /// Sleep for `delay` inside every batch delivery
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sleep for `delay` inside every flush
    pub fn with_flush_delay(mut self, delay: Duration) -> Self {
        self.flush_delay = Some(delay);
        self
    }

    /// Delivered messages in delivery order
    pub fn messages(&self) -> Vec<Arc<Message>> {
        lock_unpoisoned(&self.messages).clone()
    }

    pub fn texts(&self) -> Vec<String> {
        lock_unpoisoned(&self.messages)
            .iter()
            .map(|message| message.text.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        lock_unpoisoned(&self.messages).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of every batch received, in order
    pub fn batch_sizes(&self) -> Vec<usize> {
        lock_unpoisoned(&self.batch_sizes).clone()
    }

    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::Acquire)
    }

    /// How many delivered messages the most recent completed flush covered
    pub fn flushed_len(&self) -> usize {
        self.flushed_len.load(Ordering::Acquire)
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }
}

impl Sink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> SinkConfig {
        self.config
    }

    fn start_if_needed(&self) -> SinkResult<()> {
        self.started.store(true, Ordering::Release);
        Ok(())
    }

    fn handle_message_batch(&self, batch: &[Arc<Message>]) -> SinkResult<()> {
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        lock_unpoisoned(&self.messages).extend(batch.iter().cloned());
        lock_unpoisoned(&self.batch_sizes).push(batch.len());
        Ok(())
    }

    fn flush(&self) -> SinkResult<()> {
        let covered = self.len();
        if let Some(delay) = self.flush_delay {
            thread::sleep(delay);
        }
        self.flushed_len.store(covered, Ordering::Release);
        self.flushes.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn shutdown(&self) -> SinkResult<()> {
        self.shut_down.store(true, Ordering::Release);
        Ok(())
    }
}
