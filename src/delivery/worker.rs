//! DeliveryWorker - the single background loop between queue and sinks
//!
//! Phases:
//!
//! ```text
//!  Starting ──(preconditions ok, sinks started)──▶ Running
//!     │                                              │ queue disabled
//!     │ preconditions fail                           ▼
//!     └──▶ queue disabled, sinks shut down,       Draining ──▶ Stopped
//!          panic                                  (drain, report, shut down sinks)
//! ```
//!
//! Running iteration: reset wakeup, deliver one batch, resolve the flush
//! barrier, service a flush-now request, and wait with a timeout only if
//! nothing was done.

use crate::core::sync::{read_unpoisoned, write_unpoisoned, WakeSignal};
use crate::delivery::barrier::FlushBarrier;
use crate::delivery::sink::SinkHandle;
use crate::queue::{BoundedQueue, SequenceRange};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use strum_macros::Display;

/// Lifecycle phase of a delivery worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum WorkerPhase {
    /// No worker has been started yet
    Idle,
    Starting,
    Running,
    Draining,
    Stopped,
}

impl WorkerPhase {
    /// True while a worker thread exists and will still make progress
    pub fn is_active(self) -> bool {
        matches!(
            self,
            WorkerPhase::Starting | WorkerPhase::Running | WorkerPhase::Draining
        )
    }
}

/// State shared between a handler and its worker
#[derive(Debug)]
pub(crate) struct DeliveryState {
    pub(crate) queue: Arc<BoundedQueue>,
    /// Admitted (in) versus delivered to every sink (out)
    pub(crate) pending: SequenceRange,
    pub(crate) barrier: FlushBarrier,
    phase: RwLock<WorkerPhase>,
    delivered_batches: AtomicU64,
    delivered_messages: AtomicU64,
    flushes: AtomicU64,
}

impl DeliveryState {
    pub(crate) fn new(queue: Arc<BoundedQueue>) -> Self {
        Self {
            queue,
            pending: SequenceRange::new(),
            barrier: FlushBarrier::new(),
            phase: RwLock::new(WorkerPhase::Idle),
            delivered_batches: AtomicU64::new(0),
            delivered_messages: AtomicU64::new(0),
            flushes: AtomicU64::new(0),
        }
    }

    pub(crate) fn phase(&self) -> WorkerPhase {
        *read_unpoisoned(&self.phase)
    }

    pub(crate) fn set_phase(&self, phase: WorkerPhase) {
        *write_unpoisoned(&self.phase) = phase;
    }

    pub(crate) fn delivered_batches(&self) -> u64 {
        self.delivered_batches.load(Ordering::Relaxed)
    }

    pub(crate) fn delivered_messages(&self) -> u64 {
        self.delivered_messages.load(Ordering::Relaxed)
    }

    pub(crate) fn flushes(&self) -> u64 {
        self.flushes.load(Ordering::Relaxed)
    }
}

/// Worker tuning
#[derive(Debug, Clone, Copy)]
pub(crate) struct WorkerSettings {
    pub(crate) batch_size: usize,
    pub(crate) idle_wait: Duration,
}

/// Marks the worker stopped however `run` exits, panics included
struct StoppedOnExit<'a> {
    state: &'a DeliveryState,
}

impl Drop for StoppedOnExit<'_> {
    fn drop(&mut self) {
        self.state.set_phase(WorkerPhase::Stopped);
        if thread::panicking() {
            log::error!(
                "Delivery worker for '{}' stopped abnormally",
                self.state.queue.source().unwrap_or_default()
            );
        }
    }
}

pub(crate) struct DeliveryWorker {
    state: Arc<DeliveryState>,
    sinks: Arc<[SinkHandle]>,
    settings: WorkerSettings,
}

impl DeliveryWorker {
    pub(crate) fn new(
        state: Arc<DeliveryState>,
        sinks: Arc<[SinkHandle]>,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            state,
            sinks,
            settings,
        }
    }

    /// Run the worker on a dedicated, named OS thread
    pub(crate) fn spawn(self, thread_name: String) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(thread_name)
            .spawn(move || self.run())
    }

    /// Run the worker on the current thread until the queue is drained
    ///
    /// # Panics
    ///
    /// Panics if started without sinks, without a wakeup signal or against a
    /// disabled queue, after disabling the queue and shutting the sinks down.
    pub(crate) fn run(self) {
        let _stopped = StoppedOnExit { state: &self.state };
        self.state.set_phase(WorkerPhase::Starting);

        let wakeup = match self.check_preconditions() {
            Ok(wakeup) => wakeup,
            Err(reason) => {
                self.state.queue.disable();
                self.shutdown_sinks();
                panic!("delivery worker cannot start: {}", reason);
            }
        };

        self.start_sinks();
        self.state.set_phase(WorkerPhase::Running);
        log::debug!(
            "Delivery worker for '{}' running with {} sinks",
            self.source(),
            self.sinks.len()
        );

        while self.state.queue.is_enabled() {
            wakeup.reset();
            let delivered = self.deliver_batch();
            self.resolve_barrier();
            let flushed = self.flush_if_requested();
            if !delivered && !flushed {
                wakeup.wait_timeout(self.settings.idle_wait);
            }
        }

        self.state.set_phase(WorkerPhase::Draining);
        log::debug!(
            "Delivery worker for '{}' draining {} queued messages",
            self.source(),
            self.state.queue.count()
        );
        self.drain();
        self.shutdown_sinks();
        log::debug!(
            "Delivery worker for '{}' stopped after {} messages in {} batches",
            self.source(),
            self.state.delivered_messages(),
            self.state.delivered_batches()
        );
    }

    fn check_preconditions(&self) -> Result<Arc<WakeSignal>, &'static str> {
        if self.sinks.is_empty() {
            return Err("no sinks configured");
        }
        let wakeup = self
            .state
            .queue
            .wakeup()
            .cloned()
            .ok_or("queue has no wakeup signal")?;
        if !self.state.queue.is_enabled() {
            return Err("queue is not enabled");
        }
        Ok(wakeup)
    }

    /// Dequeue up to one batch and hand it to every sink in order
    ///
    /// Emptiness is decided by `dequeue_up_to` under the queue lock.
    fn deliver_batch(&self) -> bool {
        let batch = self.state.queue.dequeue_up_to(self.settings.batch_size);
        if batch.is_empty() {
            return false;
        }

        for sink in self.sinks.iter() {
            if let Err(err) = sink.handle_message_batch(&batch) {
                log::warn!(
                    "Sink '{}' failed to deliver {} messages: {}",
                    sink.name(),
                    batch.len(),
                    err
                );
            }
        }

        if let Some(seq) = batch.iter().rev().find_map(|message| message.sequence()) {
            let _guard = self.state.queue.lock();
            self.state.pending.record_out(seq);
        }
        self.state.delivered_batches.fetch_add(1, Ordering::Relaxed);
        self.state
            .delivered_messages
            .fetch_add(batch.len() as u64, Ordering::Relaxed);
        true
    }

    fn resolve_barrier(&self) {
        let pending = &self.state.pending;
        self.state.barrier.resolve(|target| pending.contains(target));
    }

    fn flush_if_requested(&self) -> bool {
        let Some(epoch) = self.state.barrier.take_flush_now() else {
            return false;
        };
        // Only this thread advances last_out
        let covered = self.state.pending.last_out();
        for sink in self.sinks.iter() {
            if let Err(err) = sink.flush() {
                log::warn!("Sink '{}' failed to flush: {}", sink.name(), err);
            }
        }
        self.state.barrier.complete(epoch, covered);
        self.state.flushes.fetch_add(1, Ordering::Relaxed);
        true
    }

    fn drain(&self) {
        while self.deliver_batch() {}

        if self.state.queue.emit_final_drop_report() {
            self.deliver_batch();
        }

        self.resolve_barrier();
        self.flush_if_requested();
    }

    fn start_sinks(&self) {
        for sink in self.sinks.iter() {
            if let Err(err) = sink.start_if_needed() {
                log::warn!("Sink '{}' failed to start: {}", sink.name(), err);
            }
        }
    }

    fn shutdown_sinks(&self) {
        for sink in self.sinks.iter() {
            if let Err(err) = sink.shutdown() {
                log::warn!("Sink '{}' failed to shut down: {}", sink.name(), err);
            }
        }
    }

    fn source(&self) -> String {
        self.state.queue.source().unwrap_or_default()
    }
}
