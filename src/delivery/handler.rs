//! AsyncHandler - producer-facing front of the delivery pipeline
//!
//! Producers hand messages to the handler from any thread. Admission never
//! blocks on a sink: messages land in the handler's [`BoundedQueue`] and a
//! dedicated worker thread moves them to every sink in batches.
//!
//! The handler keeps its own sequence range next to the queue's. The queue's
//! range closes when a message is dequeued; the handler's closes only once the
//! batch holding it has been handed to every sink. Flush and
//! [`AsyncHandler::is_message_delivery_in_progress`] answer against the
//! handler's range.

use crate::core::sync::{lock_unpoisoned, WakeSignal};
use crate::delivery::config::HandlerConfig;
use crate::delivery::error::{HandlerError, HandlerResult};
use crate::delivery::sink::{aggregate_type_mask, any_records_source_location, SinkHandle};
use crate::delivery::worker::{DeliveryState, DeliveryWorker, WorkerPhase, WorkerSettings};
use crate::queue::{
    Admission, BoundedQueue, Message, MessageType, MessageTypeMask, QueueGuard, QueueStats, SeqNum,
};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Point-in-time view of a handler, for diagnostics and the CLI summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerStats {
    pub name: String,
    pub phase: WorkerPhase,
    pub sinks: usize,
    pub queue: QueueStats,
    /// Last sequence number handed to every sink
    pub last_delivered: SeqNum,
    pub delivered_batches: u64,
    pub delivered_messages: u64,
    pub flushes: u64,
    /// Messages skipped because no sink wanted their type
    pub ignored: u64,
    /// True when every admitted message has reached every sink
    pub settled: bool,
}

/// What a flush call still has to wait for
enum FlushWait {
    /// Every delivered message is already flushed
    Done,
    /// Wait for this message to reach every sink, then for a sink flush
    Delivery(SeqNum),
    /// Wait for this sink flush epoch
    SinkFlush(u64),
}

/// Queue-backed handler that delivers to its sinks on a worker thread
///
/// Dropping the handler shuts it down, draining everything already admitted.
///
/// # Example
///
/// ```rust
/// use logpump::delivery::{AsyncHandler, HandlerConfig, SinkHandle};
/// use logpump::delivery::sinks::MemorySink;
/// use logpump::queue::{Message, MessageType};
/// use std::sync::Arc;
///
/// let memory = Arc::new(MemorySink::new("memory"));
/// let sinks: Vec<SinkHandle> = vec![memory.clone()];
/// let handler = AsyncHandler::new(HandlerConfig::named("doc"), sinks).unwrap();
///
/// handler.handle_message(Message::new("doc", MessageType::Info, "hello"));
/// handler.flush();
/// assert_eq!(memory.texts(), vec!["hello".to_string()]);
/// ```
pub struct AsyncHandler {
    config: HandlerConfig,
    sinks: Arc<[SinkHandle]>,
    state: Arc<DeliveryState>,
    worker: Mutex<Option<JoinHandle<()>>>,
    terminated: AtomicBool,
    type_mask: MessageTypeMask,
    records_source_location: bool,
    ignored: AtomicU64,
}

impl AsyncHandler {
    /// Build the handler and start its worker
    pub fn new(config: HandlerConfig, sinks: Vec<SinkHandle>) -> HandlerResult<Self> {
        config.validate()?;
        if sinks.is_empty() {
            return Err(HandlerError::Configuration {
                message: format!("handler '{}' needs at least one sink", config.name),
            });
        }

        let queue = BoundedQueue::with_wakeup(config.queue_config(), Arc::new(WakeSignal::new()));
        queue.set_source(config.name.as_str())?;

        let type_mask = aggregate_type_mask(&sinks);
        let records_source_location =
            config.allow_record_source_stack_frame && any_records_source_location(&sinks);

        let handler = Self {
            state: Arc::new(DeliveryState::new(Arc::new(queue))),
            sinks: sinks.into(),
            worker: Mutex::new(None),
            terminated: AtomicBool::new(false),
            type_mask,
            records_source_location,
            ignored: AtomicU64::new(0),
            config,
        };
        handler.start_if_needed()?;

        log::debug!(
            "Handler '{}' started with {} sinks, queue capacity {}",
            handler.config.name,
            handler.sinks.len(),
            handler.state.queue.capacity()
        );
        Ok(handler)
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    pub fn queue(&self) -> &BoundedQueue {
        &self.state.queue
    }

    pub fn sinks(&self) -> &[SinkHandle] {
        &self.sinks
    }

    #[cfg(test)]
    pub(crate) fn barrier(&self) -> &crate::delivery::barrier::FlushBarrier {
        &self.state.barrier
    }

    /// Union of the message types any sink accepts
    pub fn type_mask(&self) -> MessageTypeMask {
        self.type_mask
    }

    pub fn accepts(&self, message_type: MessageType) -> bool {
        self.type_mask.contains(message_type)
    }

    /// Whether producers should capture source locations for this handler
    pub fn records_source_location(&self) -> bool {
        self.records_source_location
    }

    pub fn worker_phase(&self) -> WorkerPhase {
        self.state.phase()
    }

    pub fn is_running(&self) -> bool {
        self.state.phase().is_active() && self.state.queue.is_enabled()
    }

    /// Offer one message; never blocks on a sink
    pub fn handle_message(&self, message: Message) {
        if !self.accepts(message.message_type) {
            self.ignored.fetch_add(1, Ordering::Relaxed);
            return;
        }
        let count = {
            let mut guard = self.state.queue.lock();
            self.admit(&mut guard, message);
            guard.len()
        };
        self.state.queue.notify_if_backlogged(count);
    }

    /// Offer several messages under one lock acquisition
    pub fn handle_message_batch<I>(&self, messages: I)
    where
        I: IntoIterator<Item = Message>,
    {
        let count = {
            let mut guard = self.state.queue.lock();
            for message in messages {
                if !self.accepts(message.message_type) {
                    self.ignored.fetch_add(1, Ordering::Relaxed);
                    continue;
                }
                self.admit(&mut guard, message);
            }
            guard.len()
        };
        self.state.queue.notify_if_backlogged(count);
    }

    fn admit(&self, guard: &mut QueueGuard<'_>, mut message: Message) {
        if !self.records_source_location {
            message.location = None;
        }
        if let Admission::Admitted(Some(seq)) = guard.admit(message) {
            self.state.pending.record_in(seq);
        }
    }

    /// True while `seq` is admitted but not yet handed to every sink
    pub fn is_message_delivery_in_progress(&self, seq: SeqNum) -> bool {
        self.state.pending.contains(seq)
    }

    /// Block until every message admitted before the call has reached every
    /// sink and the sinks have flushed
    ///
    /// Returns immediately when nothing delivered is still unflushed, and
    /// early if the worker stops.
    pub fn flush(&self) {
        let poll = self.config.flush_poll_interval();
        let epoch = match self.begin_flush() {
            FlushWait::Done => return,
            FlushWait::SinkFlush(epoch) => epoch,
            FlushWait::Delivery(target) => {
                while self.is_awaiting(target) {
                    thread::sleep(poll);
                }
                self.request_sink_flush()
            }
        };
        while self.is_awaiting_flush(epoch) {
            thread::sleep(poll);
        }
    }

    /// [`AsyncHandler::flush`] for async callers; polls with `tokio::time::sleep`
    pub async fn flush_async(&self) {
        let poll = self.config.flush_poll_interval();
        let epoch = match self.begin_flush() {
            FlushWait::Done => return,
            FlushWait::SinkFlush(epoch) => epoch,
            FlushWait::Delivery(target) => {
                while self.is_awaiting(target) {
                    tokio::time::sleep(poll).await;
                }
                self.request_sink_flush()
            }
        };
        while self.is_awaiting_flush(epoch) {
            tokio::time::sleep(poll).await;
        }
    }

    /// Decide what a flush has to wait for
    ///
    /// The target is the last admitted message. If it is still pending, a
    /// barrier is installed on it. If it was delivered but no completed sink
    /// flush covers it yet, a sink flush is requested and awaited.
    fn begin_flush(&self) -> FlushWait {
        let target = {
            let _guard = self.state.queue.lock();
            self.state.pending.last_in()
        };

        if !self.state.phase().is_active() {
            self.request_sink_flush();
            return FlushWait::Done;
        }

        if self.state.pending.contains(target) {
            if !self.state.barrier.request(target) {
                log::trace!(
                    "Handler '{}' flush to {} joins an outstanding barrier",
                    self.config.name,
                    target
                );
            }
            self.state.queue.wake();
            FlushWait::Delivery(target)
        } else if target.is_after(self.state.barrier.flushed_upto()) {
            FlushWait::SinkFlush(self.request_sink_flush())
        } else {
            self.request_sink_flush();
            FlushWait::Done
        }
    }

    fn request_sink_flush(&self) -> u64 {
        let epoch = self.state.barrier.request_flush_now();
        self.state.queue.wake();
        epoch
    }

    fn is_awaiting(&self, target: SeqNum) -> bool {
        self.state.pending.contains(target) && self.state.phase().is_active()
    }

    fn is_awaiting_flush(&self, epoch: u64) -> bool {
        !self.state.barrier.is_flushed(epoch) && self.state.phase().is_active()
    }

    /// Enable the queue and start a worker unless one is already running
    ///
    /// A worker that is still draining after [`BoundedQueue::disable`] is
    /// joined first. Fails once the handler has been shut down.
    pub fn start_if_needed(&self) -> HandlerResult<()> {
        if self.terminated.load(Ordering::Acquire) {
            return Err(HandlerError::ShutDown {
                name: self.config.name.clone(),
            });
        }

        let mut worker = lock_unpoisoned(&self.worker);
        if let Some(handle) = worker.take() {
            if !handle.is_finished() && self.state.queue.is_enabled() {
                *worker = Some(handle);
                return Ok(());
            }
            if handle.join().is_err() {
                log::error!(
                    "Previous delivery worker for '{}' panicked",
                    self.config.name
                );
            }
        }

        self.state.queue.enable();
        self.state.set_phase(WorkerPhase::Starting);
        let delivery = DeliveryWorker::new(
            Arc::clone(&self.state),
            Arc::clone(&self.sinks),
            WorkerSettings {
                batch_size: self.config.batch_size,
                idle_wait: self.config.idle_wait(),
            },
        );
        let handle = delivery
            .spawn(format!("logpump-{}", self.config.name))
            .map_err(|source| {
                self.state.queue.disable();
                self.state.set_phase(WorkerPhase::Stopped);
                HandlerError::WorkerSpawn {
                    name: self.config.name.clone(),
                    source,
                }
            })?;
        *worker = Some(handle);
        Ok(())
    }

    /// Stop admission, drain the queue to the sinks and join the worker
    ///
    /// Idempotent. The handler cannot be restarted afterwards.
    pub fn shutdown(&self) {
        if self.terminated.swap(true, Ordering::AcqRel) {
            return;
        }
        log::debug!("Shutting down handler '{}'", self.config.name);
        self.state.queue.disable();

        if let Some(handle) = lock_unpoisoned(&self.worker).take() {
            if handle.join().is_err() {
                log::error!("Delivery worker for '{}' panicked", self.config.name);
            }
        }
    }

    /// Wait up to `timeout` for the worker to reach `phase`
    pub fn wait_for_phase(&self, phase: WorkerPhase, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.state.phase() == phase {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(self.config.flush_poll_interval());
        }
    }

    pub fn stats(&self) -> HandlerStats {
        HandlerStats {
            name: self.config.name.clone(),
            phase: self.state.phase(),
            sinks: self.sinks.len(),
            queue: self.state.queue.stats(),
            last_delivered: self.state.pending.last_out(),
            delivered_batches: self.state.delivered_batches(),
            delivered_messages: self.state.delivered_messages(),
            flushes: self.state.flushes(),
            ignored: self.ignored.load(Ordering::Relaxed),
            settled: self.state.pending.is_settled(),
        }
    }
}

impl Drop for AsyncHandler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for AsyncHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncHandler")
            .field("name", &self.config.name)
            .field("phase", &self.state.phase())
            .field("sinks", &self.sinks.len())
            .field("type_mask", &self.type_mask)
            .finish()
    }
}
