//! Lock-free SPSC byte ring buffer.
//!
//! Producer and consumer each own a cache-line padded sequence. The
//! producer gates on a cached view of the consumer's position and
//! refreshes the cache only when the stale value forces a wait; both
//! sides busy-wait with a cooperative yield instead of parking, keeping
//! latency low at the cost of CPU while idle.
//!
//! ## APIs
//!
//! Byte-stream access:
//! - `write()` / `read()` - copy whole regions in and out
//! - `read_from()` - pull a source directly into the ring, zero-copy
//!
//! Zero-copy consumption:
//! - `peek()` / `commit()` - inspect a prefix in place, then advance
//!
//! ## Safety
//!
//! Uses `unsafe` for direct buffer access. The ring is race-free only
//! under the SPSC discipline: exactly one producer thread calling
//! `write` / `read_from`, one consumer thread calling `read` / `peek` /
//! `commit` / `write_to`. The gate check guarantees the producer's
//! region lies past everything the consumer may still read, and the
//! consumer reads only `[cseq, pseq)`, so no byte is mutated while the
//! other side can observe it.

use std::cell::{ Cell, UnsafeCell };
use std::fmt;
use std::io;
use std::sync::atomic::{ AtomicBool, Ordering };
use std::thread;

use crate::constants::DEFAULT_READ_BLOCK;
use crate::error::{ Result, SluiceError };
use crate::spsc::sequence::Sequence;
use crate::spsc::{ next_buffer_id, stream, RingBuffer };
use crate::trace;

/// Lock-free SPSC byte ring buffer
pub struct LockFreeRing {
    id: u32,
    /// Direct pointer into the storage; both sides carve disjoint slices
    /// out of it without asserting a borrow over the whole buffer
    buf: *mut u8,
    /// Capacity in bytes (power of two)
    size: i64,
    /// `size - 1`, projects a sequence onto `[0, size)`
    mask: i64,
    /// One-shot close latch
    done: AtomicBool,
    /// Producer sequence; its gate caches the consumer position
    pseq: Sequence,
    /// Consumer sequence
    cseq: Sequence,
    /// Scratch for peeks that wrap the physical end, consumer side only
    tmp: UnsafeCell<Vec<u8>>,
    /// Producer stalls on the gate (diagnostic, producer side only)
    pwait: Cell<u64>,
    /// Consumer stalls on an empty ring (diagnostic, consumer side only)
    cwait: Cell<u64>,
    /// Keep the heap allocation alive
    _storage: Box<[u8]>,
}

// One producer thread and one consumer thread share the ring through an
// Arc. The sequence invariants partition `buf`: the producer writes only
// gate-cleared space past `pseq`, the consumer reads only `[cseq, pseq)`.
// `tmp` and `cwait` stay on the consumer side, `pwait` and the gate on
// the producer side.
unsafe impl Send for LockFreeRing {}
unsafe impl Sync for LockFreeRing {}

impl LockFreeRing {
    /// Create a ring with the given capacity.
    ///
    /// A `size` of 0 selects [`DEFAULT_BUFFER_SIZE`]. The size must be a
    /// power of two no smaller than [`MIN_BUFFER_SIZE`].
    ///
    /// [`DEFAULT_BUFFER_SIZE`]: crate::constants::DEFAULT_BUFFER_SIZE
    /// [`MIN_BUFFER_SIZE`]: crate::constants::MIN_BUFFER_SIZE
    pub fn new(size: usize) -> Result<Self> {
        let size = super::checked_size(size)?;

        let mut storage = vec![0u8; size].into_boxed_slice();
        let buf = storage.as_mut_ptr();

        Ok(Self {
            id: next_buffer_id(),
            buf,
            size: size as i64,
            mask: (size - 1) as i64,
            done: AtomicBool::new(false),
            pseq: Sequence::new(),
            cseq: Sequence::new(),
            tmp: UnsafeCell::new(Vec::new()),
            pwait: Cell::new(0),
            cwait: Cell::new(0),
            _storage: storage,
        })
    }

    /// Total capacity in bytes
    #[inline(always)]
    pub fn size(&self) -> usize {
        self.size as usize
    }

    /// Times the producer stalled on the gate. Diagnostic; meaningful
    /// only from the producer thread.
    pub fn producer_waits(&self) -> u64 {
        self.pwait.get()
    }

    /// Times the consumer stalled on an empty ring. Diagnostic;
    /// meaningful only from the consumer thread.
    pub fn consumer_waits(&self) -> u64 {
        self.cwait.get()
    }

    /// Shared view of the physical region `[index, index + len)`.
    ///
    /// Bounds are guaranteed by the mask arithmetic of the callers.
    #[inline(always)]
    fn region(&self, index: usize, len: usize) -> &[u8] {
        debug_assert!(index + len <= self.size as usize);
        unsafe { std::slice::from_raw_parts(self.buf.add(index), len) }
    }

    /// Reserve space for `n` bytes at the current producer position and
    /// return that starting sequence.
    ///
    /// The wrap point is where writing `n` bytes past `pseq` would start
    /// overwriting unread data. A wait is needed when it has passed the
    /// cached consumer position, or when the cache is stale in the other
    /// direction (`gate > ppos` can only hold before the first refresh
    /// after wrapping). The spin yields the scheduler each turn and
    /// refreshes the gate from the observed consumer position on exit.
    fn wait_for_write_space(&self, n: usize) -> Result<i64> {
        let ppos = self.pseq.get();
        let next = ppos + n as i64;
        let gate = self.pseq.gate();
        let wrap = next - self.size;

        if wrap > gate || gate > ppos {
            self.pwait.set(self.pwait.get() + 1);
            trace::record_producer_wait(self.id);

            let mut cpos = self.cseq.get();
            while wrap > cpos {
                if self.done.load(Ordering::Acquire) {
                    return Err(SluiceError::Closed);
                }
                thread::yield_now();
                cpos = self.cseq.get();
            }

            self.pseq.set_gate(cpos);
        }

        Ok(ppos)
    }
}

impl RingBuffer for LockFreeRing {
    /// Pull bytes from `r` straight into the ring.
    ///
    /// Each iteration reserves the contiguous region from the producer
    /// index to at most the physical buffer end (capped at
    /// [`DEFAULT_READ_BLOCK`] bytes) and lets the source read directly
    /// into it, skipping the bounce buffer of the generic adaptor. The
    /// new producer position is published before the next read, so a
    /// source error never discards bytes already pulled.
    fn read_from(&self, r: &mut dyn io::Read) -> Result<u64> {
        let mut total = 0u64;

        loop {
            let start = match self.wait_for_write_space(DEFAULT_READ_BLOCK) {
                Ok(start) => start,
                Err(SluiceError::Closed) => return Ok(total),
                Err(e) => return Err(e),
            };

            let pstart = (start & self.mask) as usize;
            let pend = (pstart + DEFAULT_READ_BLOCK).min(self.size as usize);

            // The gate cleared [start, start + block); no other producer
            // exists and the consumer cannot cross the gate.
            let region = unsafe {
                std::slice::from_raw_parts_mut(self.buf.add(pstart), pend - pstart)
            };

            match r.read(region) {
                Ok(0) => return Ok(total),
                Ok(n) => {
                    self.pseq.set(start + n as i64);
                    total += n as u64;
                    trace::record_write(self.id, n);
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(SluiceError::Io { completed: total, source: e }),
            }
        }
    }

    fn write_to(&self, w: &mut dyn io::Write) -> Result<u64> {
        stream::write_to(self, w)
    }

    fn read(&self, p: &mut [u8]) -> Result<usize> {
        loop {
            let cpos = self.cseq.get();
            let mut ppos = self.pseq.get();

            if cpos < ppos {
                let cindex = (cpos & self.mask) as usize;
                let avail = (ppos - cpos) as usize;

                // One contiguous copy: stop at the physical end even when
                // more is buffered. Callers loop for an exact fill.
                let n = avail.min(self.size as usize - cindex).min(p.len());
                p[..n].copy_from_slice(self.region(cindex, n));

                self.cseq.set(cpos + n as i64);
                trace::record_read(self.id, n);
                return Ok(n);
            }

            // Empty: wait for the producer to publish or for close. A
            // close observed here is re-checked against the producer
            // position, so bytes published just before the latch are
            // still delivered.
            self.cwait.set(self.cwait.get() + 1);
            trace::record_consumer_wait(self.id);
            while cpos >= ppos {
                if self.done.load(Ordering::Acquire) {
                    ppos = self.pseq.get();
                    if cpos >= ppos {
                        return Err(SluiceError::Closed);
                    }
                    break;
                }
                thread::yield_now();
                ppos = self.pseq.get();
            }
        }
    }

    fn write(&self, p: &[u8]) -> Result<usize> {
        if p.len() > self.size as usize {
            return Err(SluiceError::ExceedsCapacity {
                requested: p.len(),
                capacity: self.size as usize,
            });
        }

        let start = self.wait_for_write_space(p.len())?;
        let index = (start & self.mask) as usize;
        let tail = (self.size as usize - index).min(p.len());

        // Split copy around the physical end, into gate-cleared space.
        unsafe {
            std::slice::from_raw_parts_mut(self.buf.add(index), tail)
                .copy_from_slice(&p[..tail]);
            std::slice::from_raw_parts_mut(self.buf, p.len() - tail)
                .copy_from_slice(&p[tail..]);
        }

        self.pseq.set(start + p.len() as i64);
        trace::record_write(self.id, p.len());

        Ok(p.len())
    }

    fn peek(&self, n: usize) -> Result<&[u8]> {
        if n > self.size as usize {
            return Err(SluiceError::ExceedsCapacity {
                requested: n,
                capacity: self.size as usize,
            });
        }

        let cpos = self.cseq.get();
        let mut ppos = self.pseq.get();

        if cpos >= ppos {
            self.cwait.set(self.cwait.get() + 1);
            trace::record_consumer_wait(self.id);
            while cpos >= ppos {
                if self.done.load(Ordering::Acquire) {
                    // Serve anything published just before the latch.
                    ppos = self.pseq.get();
                    if cpos >= ppos {
                        return Err(SluiceError::Closed);
                    }
                    break;
                }
                thread::yield_now();
                ppos = self.pseq.get();
            }
        }

        // Peek at most n bytes; a shorter view signals that less was
        // buffered.
        let m = ((ppos - cpos) as usize).min(n);
        let cindex = (cpos & self.mask) as usize;

        if cindex + m > self.size as usize {
            // The region wraps: assemble both halves in the scratch
            // buffer. Valid until the next peek.
            let first = self.size as usize - cindex;
            let tmp = unsafe { &mut *self.tmp.get() };
            tmp.clear();
            tmp.extend_from_slice(self.region(cindex, first));
            tmp.extend_from_slice(self.region(0, m - first));
            Ok(&tmp[..])
        } else {
            Ok(self.region(cindex, m))
        }
    }

    fn commit(&self, n: usize) -> Result<usize> {
        if n > self.size as usize {
            return Err(SluiceError::ExceedsCapacity {
                requested: n,
                capacity: self.size as usize,
            });
        }

        let cpos = self.cseq.get();
        let ppos = self.pseq.get();

        if cpos + n as i64 <= ppos {
            self.cseq.set(cpos + n as i64);
            Ok(n)
        } else {
            Err(SluiceError::InsufficientData {
                available: (ppos - cpos) as usize,
                requested: n,
            })
        }
    }

    fn len(&self) -> usize {
        // Consumer position first: the producer only ever grows `pseq`,
        // so this order keeps the advisory difference non-negative.
        let cpos = self.cseq.get();
        let ppos = self.pseq.get();
        (ppos - cpos) as usize
    }

    fn id(&self) -> u32 {
        self.id
    }

    fn close(&self) {
        self.done.store(true, Ordering::Release);
        trace::record_close(self.id);
    }
}

impl fmt::Debug for LockFreeRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockFreeRing")
            .field("id", &self.id)
            .field("size", &self.size)
            .field("len", &self.len())
            .field("closed", &self.done.load(Ordering::Acquire))
            .finish()
    }
}
