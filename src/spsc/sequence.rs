//! Cache-line padded sequence counters.
//!
//! A sequence identifies a monotonic logical byte position; the physical
//! index is `sequence & mask`. Producer and consumer each own one
//! sequence: the owner publishes with a release store, the other side
//! observes with an acquire load. Padding each sequence to a full cache
//! line keeps the two counters from sharing a line, so progress on one
//! side does not invalidate the other's cached copy.

use std::cell::Cell;
use std::sync::atomic::{ AtomicI64, Ordering };

use crate::constants::CACHE_LINE_SIZE;

/// A padded sequence: the shared cursor plus the owner-private gate.
///
/// `gate` caches the last observed position of the counterparty. Only the
/// producer consults it (to decide whether a write would overrun unread
/// bytes) and only the producer thread touches it, so it is a plain
/// `Cell` rather than an atomic. The cache may lag behind the real
/// consumer position; the gate check refreshes it when the stale value
/// forces a wait.
#[repr(align(64))]
pub(crate) struct Sequence {
    cursor: AtomicI64,
    gate: Cell<i64>,
    _pad: [u8; CACHE_LINE_SIZE - 16],
}

// The cursor is atomic; the gate has a single writer and a single reader
// (the owning thread) under the SPSC discipline documented on the ring
// types.
unsafe impl Sync for Sequence {}

impl Sequence {
    pub(crate) fn new() -> Self {
        Self {
            cursor: AtomicI64::new(0),
            gate: Cell::new(0),
            _pad: [0; CACHE_LINE_SIZE - 16],
        }
    }

    /// Current cursor position (acquire)
    #[inline(always)]
    pub(crate) fn get(&self) -> i64 {
        self.cursor.load(Ordering::Acquire)
    }

    /// Publish a new cursor position (release)
    #[inline(always)]
    pub(crate) fn set(&self, seq: i64) {
        self.cursor.store(seq, Ordering::Release);
    }

    /// Cached counterparty position, owner thread only
    #[inline(always)]
    pub(crate) fn gate(&self) -> i64 {
        self.gate.get()
    }

    /// Refresh the cached counterparty position, owner thread only
    #[inline(always)]
    pub(crate) fn set_gate(&self, seq: i64) {
        self.gate.set(seq);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_occupies_a_full_cache_line() {
        assert_eq!(std::mem::size_of::<Sequence>(), CACHE_LINE_SIZE);
        assert_eq!(std::mem::align_of::<Sequence>(), CACHE_LINE_SIZE);
    }

    #[test]
    fn test_get_set_round_trip() {
        let seq = Sequence::new();
        assert_eq!(seq.get(), 0);

        seq.set(4096);
        assert_eq!(seq.get(), 4096);

        seq.set_gate(2048);
        assert_eq!(seq.gate(), 2048);
        // The gate is a cache, not the cursor.
        assert_eq!(seq.get(), 4096);
    }
}
