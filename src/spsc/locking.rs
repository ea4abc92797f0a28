//! Mutex-based SPSC byte ring buffer.
//!
//! Baseline implementation of the same contract as
//! [`LockFreeRing`](crate::LockFreeRing): one mutex guards the two
//! sequences and the storage, and a pair of condition variables replaces
//! the busy-yield waits - `not_empty` parks the consumer, `not_full`
//! parks the producer, and close broadcasts both. No cache-line padding
//! is needed since every access already serializes on the lock.

use std::cell::UnsafeCell;
use std::fmt;
use std::io;

use parking_lot::{ Condvar, Mutex };

use crate::error::{ Result, SluiceError };
use crate::spsc::{ next_buffer_id, stream, RingBuffer };
use crate::trace;

/// Mutable state guarded by the ring's mutex
struct State {
    buf: Box<[u8]>,
    pseq: i64,
    cseq: i64,
    done: bool,
}

/// Mutex/condvar SPSC byte ring buffer
pub struct LockingRing {
    id: u32,
    size: usize,
    mask: i64,
    state: Mutex<State>,
    /// Consumer waits here; the producer signals after publishing
    not_empty: Condvar,
    /// Producer waits here; the consumer signals after consuming
    not_full: Condvar,
    /// Scratch for peek views, consumer side only. Peeks always assemble
    /// here because the returned view outlives the mutex guard.
    tmp: UnsafeCell<Vec<u8>>,
}

// Everything except `tmp` is guarded by the mutex; `tmp` is touched only
// by the consumer thread under the SPSC discipline.
unsafe impl Send for LockingRing {}
unsafe impl Sync for LockingRing {}

impl LockingRing {
    /// Create a ring with the given capacity.
    ///
    /// Size rules are shared with [`LockFreeRing::new`]: 0 selects the
    /// default, the size must be a power of two and at least the minimum.
    ///
    /// [`LockFreeRing::new`]: crate::LockFreeRing::new
    pub fn new(size: usize) -> Result<Self> {
        let size = super::checked_size(size)?;

        Ok(Self {
            id: next_buffer_id(),
            size,
            mask: (size - 1) as i64,
            state: Mutex::new(State {
                buf: vec![0u8; size].into_boxed_slice(),
                pseq: 0,
                cseq: 0,
                done: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            tmp: UnsafeCell::new(Vec::new()),
        })
    }

    /// Total capacity in bytes
    #[inline(always)]
    pub fn size(&self) -> usize {
        self.size
    }
}

impl RingBuffer for LockingRing {
    fn read_from(&self, r: &mut dyn io::Read) -> Result<u64> {
        stream::read_from(self, r)
    }

    fn write_to(&self, w: &mut dyn io::Write) -> Result<u64> {
        stream::write_to(self, w)
    }

    fn read(&self, p: &mut [u8]) -> Result<usize> {
        let mut state = self.state.lock();

        while state.cseq >= state.pseq {
            if state.done {
                return Err(SluiceError::Closed);
            }
            self.not_empty.wait(&mut state);
        }

        let cindex = (state.cseq & self.mask) as usize;
        let avail = (state.pseq - state.cseq) as usize;

        // One contiguous copy, stopping at the physical end; callers
        // loop for an exact fill.
        let n = avail.min(self.size - cindex).min(p.len());
        p[..n].copy_from_slice(&state.buf[cindex..cindex + n]);
        state.cseq += n as i64;

        trace::record_read(self.id, n);
        self.not_full.notify_one();
        Ok(n)
    }

    fn write(&self, p: &[u8]) -> Result<usize> {
        if p.len() > self.size {
            return Err(SluiceError::ExceedsCapacity {
                requested: p.len(),
                capacity: self.size,
            });
        }

        let mut state = self.state.lock();

        while (self.size as i64) - (state.pseq - state.cseq) < p.len() as i64 {
            if state.done {
                return Err(SluiceError::Closed);
            }
            self.not_full.wait(&mut state);
        }

        let start = (state.pseq & self.mask) as usize;
        stream::ring_copy(&mut state.buf, p, start);
        state.pseq += p.len() as i64;

        trace::record_write(self.id, p.len());
        self.not_empty.notify_one();
        Ok(p.len())
    }

    fn peek(&self, n: usize) -> Result<&[u8]> {
        if n > self.size {
            return Err(SluiceError::ExceedsCapacity {
                requested: n,
                capacity: self.size,
            });
        }

        let mut state = self.state.lock();

        while state.cseq >= state.pseq {
            if state.done {
                return Err(SluiceError::Closed);
            }
            self.not_empty.wait(&mut state);
        }

        let m = ((state.pseq - state.cseq) as usize).min(n);
        let cindex = (state.cseq & self.mask) as usize;
        let first = m.min(self.size - cindex);

        // Assemble in the consumer-private scratch: the caller keeps the
        // view after the lock is released.
        let tmp = unsafe { &mut *self.tmp.get() };
        tmp.clear();
        tmp.extend_from_slice(&state.buf[cindex..cindex + first]);
        tmp.extend_from_slice(&state.buf[..m - first]);

        Ok(&tmp[..])
    }

    fn commit(&self, n: usize) -> Result<usize> {
        if n > self.size {
            return Err(SluiceError::ExceedsCapacity {
                requested: n,
                capacity: self.size,
            });
        }

        let mut state = self.state.lock();

        if state.cseq + n as i64 <= state.pseq {
            state.cseq += n as i64;
            self.not_full.notify_one();
            Ok(n)
        } else {
            Err(SluiceError::InsufficientData {
                available: (state.pseq - state.cseq) as usize,
                requested: n,
            })
        }
    }

    fn len(&self) -> usize {
        let state = self.state.lock();
        (state.pseq - state.cseq) as usize
    }

    fn id(&self) -> u32 {
        self.id
    }

    fn close(&self) {
        let mut state = self.state.lock();
        state.done = true;
        trace::record_close(self.id);

        // Wake both sides so blocked waiters observe the latch.
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }
}

impl fmt::Debug for LockingRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("LockingRing")
            .field("id", &self.id)
            .field("size", &self.size)
            .field("len", &((state.pseq - state.cseq) as usize))
            .field("closed", &state.done)
            .finish()
    }
}
