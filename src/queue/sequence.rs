//! Sequence numbers and the pending-range tracker
//!
//! A [`SequenceRange`] tracks the half-open window `(last_out, last_in]` of
//! sequence numbers that are still logically pending. Both counters only move
//! forward and are compared by signed distance, so the window keeps working
//! after the underlying `u64` wraps.
//!
//! Writers serialize through the owning queue's mutex. Readers may take a
//! lock-free [`RangeSnapshot`]; the snapshot reads `last_out` before `last_in`
//! so that a racing update can only make a message look pending for slightly
//! longer, never delivered too early.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic message tag assigned at admission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SeqNum(u64);

impl SeqNum {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    /// The following sequence number, wrapping at `u64::MAX`
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Signed distance `self - other`
    ///
    /// Valid while the two numbers are less than `i64::MAX` apart, which is
    /// what lets ordering survive counter wraparound.
    pub fn distance_from(self, other: SeqNum) -> i64 {
        self.0.wrapping_sub(other.0) as i64
    }

    /// True if `self` was issued strictly after `other`
    pub fn is_after(self, other: SeqNum) -> bool {
        self.distance_from(other) > 0
    }
}

impl fmt::Display for SeqNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SeqNum {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Point-in-time copy of a [`SequenceRange`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSnapshot {
    pub last_in: SeqNum,
    pub last_out: SeqNum,
}

impl RangeSnapshot {
    /// `(last_in - seq) >= 0 && (seq - last_out) > 0`
    pub fn contains(&self, seq: SeqNum) -> bool {
        self.last_in.distance_from(seq) >= 0 && seq.distance_from(self.last_out) > 0
    }

    /// Number of sequence numbers in the window
    pub fn len(&self) -> u64 {
        self.last_in.distance_from(self.last_out).max(0) as u64
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Pair of monotonic counters: last admitted and last retired sequence number
#[derive(Debug, Default)]
pub struct SequenceRange {
    last_in: AtomicU64,
    last_out: AtomicU64,
}

impl SequenceRange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Range whose counters both start at `seq` (nothing pending)
    pub fn starting_at(seq: SeqNum) -> Self {
        Self {
            last_in: AtomicU64::new(seq.value()),
            last_out: AtomicU64::new(seq.value()),
        }
    }

    pub fn last_in(&self) -> SeqNum {
        SeqNum(self.last_in.load(Ordering::Acquire))
    }

    pub fn last_out(&self) -> SeqNum {
        SeqNum(self.last_out.load(Ordering::Acquire))
    }

    /// Advance `last_in` to `seq`; stale values are ignored
    ///
    /// Callers must hold the owning queue's lock.
    pub(crate) fn record_in(&self, seq: SeqNum) {
        if seq.is_after(self.last_in()) {
            self.last_in.store(seq.value(), Ordering::Release);
        }
    }

    /// Advance `last_out` to `seq`; stale values are ignored
    ///
    /// If `seq` is ahead of `last_in` (a message admitted through a path that
    /// did not record it here), `last_in` is pulled forward first so that
    /// `last_out <= last_in` keeps holding. Callers must hold the owning
    /// queue's lock.
    pub(crate) fn record_out(&self, seq: SeqNum) {
        if !seq.is_after(self.last_out()) {
            return;
        }
        if seq.is_after(self.last_in()) {
            self.last_in.store(seq.value(), Ordering::Release);
        }
        self.last_out.store(seq.value(), Ordering::Release);
    }

    /// Ordered snapshot: `last_out` is read before `last_in`
    pub fn snapshot(&self) -> RangeSnapshot {
        let last_out = self.last_out();
        let last_in = self.last_in();
        RangeSnapshot { last_in, last_out }
    }

    /// Whether `seq` is still inside the pending window
    pub fn contains(&self, seq: SeqNum) -> bool {
        self.snapshot().contains(seq)
    }

    /// True when everything recorded in has also been recorded out
    pub(crate) fn is_settled(&self) -> bool {
        self.snapshot().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_range_contains_nothing() {
        let range = SequenceRange::new();

        assert!(!range.contains(SeqNum::new(0)));
        assert!(!range.contains(SeqNum::new(1)));
        assert!(range.is_settled());
    }

    #[test]
    fn test_membership_boundaries() {
        let range = SequenceRange::new();
        for seq in 1..=5 {
            range.record_in(SeqNum::new(seq));
        }
        range.record_out(SeqNum::new(2));

        // Window is (2, 5]
        assert!(!range.contains(SeqNum::new(2)));
        assert!(range.contains(SeqNum::new(3)));
        assert!(range.contains(SeqNum::new(5)));
        assert!(!range.contains(SeqNum::new(6)));
        assert_eq!(range.snapshot().len(), 3);
    }

    #[test]
    fn test_last_dequeued_is_no_longer_pending() {
        let range = SequenceRange::new();
        range.record_in(SeqNum::new(1));
        assert!(range.contains(SeqNum::new(1)));

        range.record_out(SeqNum::new(1));
        assert!(!range.contains(SeqNum::new(1)));
        assert!(range.is_settled());
    }

    #[test]
    fn test_counters_never_move_backwards() {
        let range = SequenceRange::new();
        range.record_in(SeqNum::new(10));
        range.record_in(SeqNum::new(4));
        assert_eq!(range.last_in(), SeqNum::new(10));

        range.record_out(SeqNum::new(8));
        range.record_out(SeqNum::new(3));
        assert_eq!(range.last_out(), SeqNum::new(8));
    }

    #[test]
    fn test_record_out_ahead_of_in_keeps_invariant() {
        let range = SequenceRange::new();
        range.record_in(SeqNum::new(3));
        range.record_out(SeqNum::new(4));

        let snapshot = range.snapshot();
        assert_eq!(snapshot.last_in, SeqNum::new(4));
        assert_eq!(snapshot.last_out, SeqNum::new(4));
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_membership_across_wraparound() {
        let start = SeqNum::new(u64::MAX - 1);
        let range = SequenceRange::starting_at(start);

        let mut seq = start;
        let mut issued = Vec::new();
        for _ in 0..4 {
            seq = seq.next();
            range.record_in(seq);
            issued.push(seq);
        }
        // Issued: MAX, 0, 1, 2
        assert_eq!(issued[1], SeqNum::new(0));
        assert!(issued.iter().all(|s| range.contains(*s)));

        range.record_out(issued[1]);
        assert!(!range.contains(issued[0]));
        assert!(!range.contains(issued[1]));
        assert!(range.contains(issued[2]));
        assert!(range.contains(issued[3]));
        assert_eq!(range.snapshot().len(), 2);
    }

    #[test]
    fn test_seqnum_ordering_by_distance() {
        assert!(SeqNum::new(2).is_after(SeqNum::new(1)));
        assert!(!SeqNum::new(1).is_after(SeqNum::new(1)));
        assert!(SeqNum::new(0).is_after(SeqNum::new(u64::MAX)));
        assert_eq!(SeqNum::new(0).distance_from(SeqNum::new(u64::MAX)), 1);
    }
}
