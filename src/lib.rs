//! # sluice
//!
//! Byte-oriented single-producer / single-consumer ring buffer.
//!
//! A fixed-size byte ring is shared between one producer thread and one
//! consumer thread. Logical positions are monotonic 64-bit sequences;
//! the physical index is `sequence & (size - 1)`, so capacities are
//! powers of two. Two interchangeable implementations share the
//! [`RingBuffer`] contract:
//!
//! | Variant | Type | Synchronization |
//! |---------|------|-----------------|
//! | Lock-free | [`LockFreeRing`] | padded atomic sequences, busy-yield gating |
//! | Locking | [`LockingRing`] | mutex + two condition variables |
//!
//! The byte-stream interface ([`write`](RingBuffer::write) /
//! [`read`](RingBuffer::read)) moves whole regions; the zero-copy
//! interface ([`peek`](RingBuffer::peek) / [`commit`](RingBuffer::commit))
//! inspects a prefix in place before advancing. The
//! [`read_from`](RingBuffer::read_from) / [`write_to`](RingBuffer::write_to)
//! pumps bridge the ring to any `io::Read` / `io::Write`.
//!
//! ## Example
//!
//! ```
//! use std::io::Cursor;
//! use std::sync::Arc;
//! use std::thread;
//!
//! use sluice::{ LockFreeRing, RingBuffer };
//!
//! let ring = Arc::new(LockFreeRing::new(4096)?);
//!
//! let producer = {
//!     let ring = Arc::clone(&ring);
//!     thread::spawn(move || {
//!         let mut source = Cursor::new(vec![0x61u8; 10_000]);
//!         ring.read_from(&mut source).unwrap();
//!         ring.close();
//!     })
//! };
//!
//! let mut out = Vec::new();
//! let drained = ring.write_to(&mut out)?;
//! producer.join().unwrap();
//!
//! assert_eq!(drained, 10_000);
//! assert!(out.iter().all(|&b| b == 0x61));
//! # Ok::<(), sluice::SluiceError>(())
//! ```
//!
//! ## Discipline
//!
//! The ring claims race-freedom only for exactly one producer thread and
//! one consumer thread. Peek views are invalidated by the next consumer
//! operation; `close` is the single one-shot cancellation mechanism.

pub mod constants;
pub mod error;
pub mod spsc;
pub(crate) mod trace;

pub use constants::{ DEFAULT_BUFFER_SIZE, DEFAULT_READ_BLOCK, DEFAULT_WRITE_BLOCK };
pub use error::{ Result, SluiceError };
pub use spsc::{ LockFreeRing, LockingRing, RingBuffer };
