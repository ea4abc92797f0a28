//! Byte-oriented SPSC ring buffers.
//!
//! ## Implementations
//!
//! | Variant | Type | Synchronization |
//! |---------|------|-----------------|
//! | Lock-free | [`LockFreeRing`] | padded atomic sequences, busy-yield gating |
//! | Locking | [`LockingRing`] | mutex + two condition variables |
//!
//! Both implement the [`RingBuffer`] trait, so callers and test suites
//! can be written against either. The lock-free ring is the primary
//! implementation; the locking ring is a baseline with the identical
//! contract.
//!
//! ## Module Organization
//!
//! - `lockfree` - atomic-sequence implementation
//! - `locking` - mutex/condvar implementation
//! - `stream` - adaptors bridging a ring to `io::Read` / `io::Write`
//! - `sequence` - cache-line padded counters
//!
//! ## Safety
//!
//! The lock-free ring uses `unsafe` for direct buffer access and is
//! race-free only under the SPSC discipline: exactly one producer thread
//! and one consumer thread. See the type-level docs.

use std::io;
use std::sync::atomic::{ AtomicU32, Ordering };

use crate::constants::{ DEFAULT_BUFFER_SIZE, MIN_BUFFER_SIZE };
use crate::error::{ Result, SluiceError };

pub mod lockfree;
pub mod locking;
pub mod stream;
mod sequence;

pub use lockfree::LockFreeRing;
pub use locking::LockingRing;

/// Process-wide counter handing out buffer ids at construction
static BUFFER_COUNT: AtomicU32 = AtomicU32::new(0);

pub(crate) fn next_buffer_id() -> u32 {
    BUFFER_COUNT.fetch_add(1, Ordering::Relaxed) + 1
}

/// Validate and resolve a requested ring capacity.
///
/// A size of 0 selects [`DEFAULT_BUFFER_SIZE`]. The size must be a power
/// of two (so a mask projects sequences onto the buffer) and large enough
/// to hold two read blocks.
pub(crate) fn checked_size(size: usize) -> Result<usize> {
    let size = if size == 0 { DEFAULT_BUFFER_SIZE } else { size };

    if !size.is_power_of_two() {
        return Err(SluiceError::NotPowerOfTwo {
            size,
            suggested: size.next_power_of_two(),
        });
    }

    if size < MIN_BUFFER_SIZE {
        return Err(SluiceError::TooSmall {
            size,
            min: MIN_BUFFER_SIZE,
        });
    }

    Ok(size)
}

/// Capability set shared by both ring buffer implementations.
///
/// The ring is a streaming channel between exactly one producer thread
/// and one consumer thread, usually shared through an `Arc`. Producer
/// operations are [`write`](RingBuffer::write) and
/// [`read_from`](RingBuffer::read_from); consumer operations are
/// [`read`](RingBuffer::read), [`peek`](RingBuffer::peek),
/// [`commit`](RingBuffer::commit) and [`write_to`](RingBuffer::write_to).
/// Either side may call [`len`](RingBuffer::len), [`id`](RingBuffer::id)
/// and [`close`](RingBuffer::close).
pub trait RingBuffer: Send + Sync {
    /// Pull bytes from `r` into the ring until the source is exhausted
    /// or the ring is closed.
    ///
    /// Returns the total number of bytes forwarded. A source error
    /// surfaces as [`SluiceError::Io`] carrying that count.
    fn read_from(&self, r: &mut dyn io::Read) -> Result<u64>;

    /// Push buffered bytes into `w` until the ring is closed and
    /// drained.
    ///
    /// Returns the total number of bytes forwarded. A sink error
    /// surfaces as [`SluiceError::Io`] carrying that count.
    fn write_to(&self, w: &mut dyn io::Write) -> Result<u64>;

    /// Copy up to `p.len()` bytes out of the ring.
    ///
    /// Blocks until at least one byte is available or the ring closes.
    /// Performs at most one contiguous copy, so the count returned may be
    /// short of `p.len()` when the region wraps the physical end of the
    /// buffer - callers wanting an exact fill loop.
    fn read(&self, p: &mut [u8]) -> Result<usize>;

    /// Place all of `p` into the ring, blocking until it fits.
    ///
    /// Fails with [`SluiceError::ExceedsCapacity`] when `p` can never fit
    /// and [`SluiceError::Closed`] when the ring closes during the wait.
    fn write(&self, p: &[u8]) -> Result<usize>;

    /// Borrow up to `n` buffered bytes without consuming them.
    ///
    /// Blocks until at least one byte is available or the ring closes. A
    /// view shorter than `n` means fewer bytes were buffered. The view is
    /// invalidated by the next `peek`, `read` or `commit`; consume or
    /// copy it before touching the ring again.
    fn peek(&self, n: usize) -> Result<&[u8]>;

    /// Consume exactly `n` previously peeked bytes.
    ///
    /// All-or-nothing and never blocks: when fewer than `n` bytes are
    /// buffered nothing is consumed and
    /// [`SluiceError::InsufficientData`] is returned. Peek the maximum,
    /// then commit exactly what was used.
    fn commit(&self, n: usize) -> Result<usize>;

    /// Buffered byte count. Advisory: the producer and consumer
    /// positions are sampled independently, not as a snapshot.
    fn len(&self) -> usize;

    /// True when no bytes are buffered. Advisory, like `len`.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Construction-time identifier, unique within the process
    fn id(&self) -> u32;

    /// Set the close latch and release any blocked party.
    ///
    /// One-shot and idempotent; the ring is not reusable afterwards.
    fn close(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_size_accepts_powers_of_two() {
        assert_eq!(checked_size(4096).unwrap(), 4096);
        assert_eq!(checked_size(MIN_BUFFER_SIZE).unwrap(), MIN_BUFFER_SIZE);
    }

    #[test]
    fn test_checked_size_zero_selects_default() {
        assert_eq!(checked_size(0).unwrap(), DEFAULT_BUFFER_SIZE);
    }

    #[test]
    fn test_checked_size_suggests_next_power_of_two() {
        match checked_size(5000) {
            Err(SluiceError::NotPowerOfTwo { size, suggested }) => {
                assert_eq!(size, 5000);
                assert_eq!(suggested, 8192);
            }
            other => panic!("expected NotPowerOfTwo, got {:?}", other),
        }
    }

    #[test]
    fn test_checked_size_rejects_small_rings() {
        match checked_size(1024) {
            Err(SluiceError::TooSmall { size, min }) => {
                assert_eq!(size, 1024);
                assert_eq!(min, MIN_BUFFER_SIZE);
            }
            other => panic!("expected TooSmall, got {:?}", other),
        }
    }

    #[test]
    fn test_buffer_ids_are_unique() {
        let a = next_buffer_id();
        let b = next_buffer_id();
        assert!(b > a);
    }
}
