//! Flush barrier shared between flush callers and the delivery worker
//!
//! At most one target sequence number is pending at a time. A request that
//! arrives while a target is outstanding is absorbed: the earliest unresolved
//! target wins, and later callers simply wait on their own target through the
//! pending range.
//!
//! Sink flushes are counted in epochs. Every flush-now request opens a new
//! epoch; the worker records the newest epoch it has served once the sinks
//! are flushed, so a caller can wait for a flush that started after its
//! request. Each completion also records the last sequence number the sinks
//! had received before flushing, which tells a caller whether anything already
//! delivered may still sit in a sink buffer.

use crate::core::sync::lock_unpoisoned;
use crate::queue::SeqNum;
use std::sync::Mutex;

#[derive(Debug, Default)]
struct BarrierState {
    target: Option<SeqNum>,
    flush_now: bool,
    requested_epoch: u64,
    completed_epoch: u64,
    flushed_upto: SeqNum,
}

impl BarrierState {
    fn open_epoch(&mut self) -> u64 {
        self.flush_now = true;
        self.requested_epoch += 1;
        self.requested_epoch
    }
}

#[derive(Debug, Default)]
pub struct FlushBarrier {
    state: Mutex<BarrierState>,
}

impl FlushBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `target` unless a target is already outstanding
    ///
    /// Returns true if `target` was installed.
    pub fn request(&self, target: SeqNum) -> bool {
        let mut state = lock_unpoisoned(&self.state);
        if state.target.is_some() {
            return false;
        }
        state.target = Some(target);
        true
    }

    /// Ask for an immediate sink flush without a target
    ///
    /// Returns the epoch to pass to [`FlushBarrier::is_flushed`].
    pub fn request_flush_now(&self) -> u64 {
        lock_unpoisoned(&self.state).open_epoch()
    }

    /// Turn the pending target into a flush-now request once it is delivered
    ///
    /// `in_flight` reports whether a sequence number is still pending.
    /// Returns true if a target was resolved.
    pub fn resolve<F>(&self, in_flight: F) -> bool
    where
        F: FnOnce(SeqNum) -> bool,
    {
        let mut state = lock_unpoisoned(&self.state);
        match state.target {
            Some(target) if !in_flight(target) => {
                state.target = None;
                state.open_epoch();
                true
            }
            _ => false,
        }
    }

    /// Consume a pending flush-now request
    ///
    /// Returns the epoch being served; report it through
    /// [`FlushBarrier::complete`] once the sinks are flushed.
    pub fn take_flush_now(&self) -> Option<u64> {
        let mut state = lock_unpoisoned(&self.state);
        std::mem::take(&mut state.flush_now).then_some(state.requested_epoch)
    }

    /// Record that every epoch up to `epoch` has been flushed, covering every
    /// message delivered up to `covered`
    pub fn complete(&self, epoch: u64, covered: SeqNum) {
        let mut state = lock_unpoisoned(&self.state);
        state.completed_epoch = state.completed_epoch.max(epoch);
        if covered.is_after(state.flushed_upto) {
            state.flushed_upto = covered;
        }
    }

    pub fn is_flushed(&self, epoch: u64) -> bool {
        lock_unpoisoned(&self.state).completed_epoch >= epoch
    }

    /// Last sequence number known to be flushed out of every sink
    pub fn flushed_upto(&self) -> SeqNum {
        lock_unpoisoned(&self.state).flushed_upto
    }

    #[cfg(test)]
    pub(crate) fn pending_target(&self) -> Option<SeqNum> {
        lock_unpoisoned(&self.state).target
    }

    #[cfg(test)]
    pub(crate) fn is_pending(&self) -> bool {
        let state = lock_unpoisoned(&self.state);
        state.target.is_some() || state.flush_now
    }
}
