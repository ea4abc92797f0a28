//! Contract tests shared by both ring buffer implementations.
//!
//! Every scenario runs against the lock-free ring and the locking ring
//! through the `RingBuffer` trait, so the two variants cannot drift
//! apart: fill through `read_from`, drain through `read`, the
//! `peek`/`commit` pair, the `write_to` pump, and close behavior.

use std::io::Cursor;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use sluice::{LockFreeRing, LockingRing, RingBuffer, SluiceError};

type Factory = fn(usize) -> Arc<dyn RingBuffer>;

fn lockfree(size: usize) -> Arc<dyn RingBuffer> {
    Arc::new(LockFreeRing::new(size).unwrap())
}

fn locking(size: usize) -> Arc<dyn RingBuffer> {
    Arc::new(LockingRing::new(size).unwrap())
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Pull `n` bytes of `b'a'` into the ring through `read_from` and check
/// the full count arrived.
fn fill(ring: &dyn RingBuffer, n: usize) {
    let mut source = Cursor::new(vec![b'a'; n]);
    let total = ring.read_from(&mut source).unwrap();
    assert_eq!(total, n as u64);
}

fn filled_ring(make: Factory, fill_bytes: usize, ring_size: usize) -> Arc<dyn RingBuffer> {
    let ring = make(ring_size);
    fill(ring.as_ref(), fill_bytes);
    assert_eq!(ring.len(), fill_bytes);
    ring
}

// --- read_from fills the ring and reports the forwarded count ---------

fn check_read_from(make: Factory) {
    filled_ring(make, 144, 4096);
    filled_ring(make, 2048, 4096);
    filled_ring(make, 3072, 4096);
}

#[test]
fn lockfree_read_from_counts() {
    check_read_from(lockfree);
}

#[test]
fn locking_read_from_counts() {
    check_read_from(locking);
}

// --- read drains in contiguous chunks ---------------------------------

fn check_read_bytes(make: Factory) {
    let ring = filled_ring(make, 2048, 4096);

    let mut p = vec![0u8; 256];
    assert_eq!(ring.read(&mut p).unwrap(), 256);

    let mut p2 = vec![0u8; 4096];
    assert_eq!(ring.read(&mut p2).unwrap(), 2048 - 256);
}

#[test]
fn lockfree_read_bytes() {
    check_read_bytes(lockfree);
}

#[test]
fn locking_read_bytes() {
    check_read_bytes(locking);
}

// --- commit consumes all-or-nothing -----------------------------------

fn check_commit(make: Factory) {
    let ring = filled_ring(make, 2048, 4096);

    assert_eq!(ring.commit(256).unwrap(), 256);

    match ring.commit(2048) {
        Err(SluiceError::InsufficientData { available, requested }) => {
            assert_eq!(available, 1792);
            assert_eq!(requested, 2048);
        }
        other => panic!("expected InsufficientData, got {:?}", other),
    }

    assert_eq!(ring.len(), 2048 - 256);
}

#[test]
fn lockfree_commit() {
    check_commit(lockfree);
}

#[test]
fn locking_commit() {
    check_commit(locking);
}

// --- peek inspects without advancing ----------------------------------

fn check_peek(make: Factory) {
    let ring = filled_ring(make, 2048, 4096);

    for n in [100usize, 1000] {
        let view = ring.peek(n).unwrap();
        assert_eq!(view.len(), n);
        assert!(view.iter().all(|&b| b == b'a'));
        assert_eq!(ring.len(), 2048);
    }
}

#[test]
fn lockfree_peek() {
    check_peek(lockfree);
}

#[test]
fn locking_peek() {
    check_peek(locking);
}

// --- a producer thread streams into a reading consumer ----------------

fn check_streaming_read(make: Factory) {
    let ring = make(4096);
    let payload = pattern(10_000);

    let producer = {
        let ring = Arc::clone(&ring);
        let payload = payload.clone();
        thread::spawn(move || {
            let mut source = Cursor::new(payload);
            let total = ring.read_from(&mut source).unwrap();
            assert_eq!(total, 10_000);
        })
    };

    let mut collected = Vec::with_capacity(payload.len());
    let mut p = vec![0u8; 1024];
    while collected.len() < payload.len() {
        let n = ring.read(&mut p).unwrap();
        collected.extend_from_slice(&p[..n]);
        // Sampled invariant: the buffered length never exceeds capacity.
        assert!(ring.len() <= 4096);
    }

    producer.join().unwrap();
    assert_eq!(collected, payload);
}

#[test]
fn lockfree_streaming_read() {
    check_streaming_read(lockfree);
}

#[test]
fn locking_streaming_read() {
    check_streaming_read(locking);
}

// --- peek/commit loop keeps byte order across the wrap -----------------

fn check_streaming_peek_commit(make: Factory) {
    let ring = make(4096);
    let payload = pattern(10_000);

    let producer = {
        let ring = Arc::clone(&ring);
        let payload = payload.clone();
        thread::spawn(move || {
            let mut source = Cursor::new(payload);
            ring.read_from(&mut source).unwrap();
        })
    };

    let mut collected = Vec::with_capacity(payload.len());
    while collected.len() < payload.len() {
        let view = ring.peek(1024).unwrap();
        let n = view.len();
        collected.extend_from_slice(view);
        assert_eq!(ring.commit(n).unwrap(), n);
    }

    producer.join().unwrap();
    assert_eq!(collected, payload);
}

#[test]
fn lockfree_streaming_peek_commit() {
    check_streaming_peek_commit(lockfree);
}

#[test]
fn locking_streaming_peek_commit() {
    check_streaming_peek_commit(locking);
}

// --- write_to drains everything and observes close ---------------------

fn check_write_to(make: Factory) {
    let ring = make(4096);
    let payload = pattern(10_000);

    let producer = {
        let ring = Arc::clone(&ring);
        let payload = payload.clone();
        thread::spawn(move || {
            let mut source = Cursor::new(payload);
            ring.read_from(&mut source).unwrap();
            thread::sleep(Duration::from_millis(100));
            ring.close();
        })
    };

    let mut sink = Vec::with_capacity(payload.len());
    let total = ring.write_to(&mut sink).unwrap();

    producer.join().unwrap();
    assert_eq!(total, 10_000);
    assert_eq!(sink, payload);
}

#[test]
fn lockfree_write_to() {
    check_write_to(lockfree);
}

#[test]
fn locking_write_to() {
    check_write_to(locking);
}

// --- the write path preserves FIFO order across many wraps -------------

fn check_write_path_fifo(make: Factory) {
    let ring = make(4096);
    let payload = pattern(65_536);

    let producer = {
        let ring = Arc::clone(&ring);
        let payload = payload.clone();
        thread::spawn(move || {
            for chunk in payload.chunks(1500) {
                assert_eq!(ring.write(chunk).unwrap(), chunk.len());
            }
            ring.close();
        })
    };

    let mut collected = Vec::with_capacity(payload.len());
    let mut p = vec![0u8; 2048];
    loop {
        match ring.read(&mut p) {
            Ok(n) => collected.extend_from_slice(&p[..n]),
            Err(SluiceError::Closed) => break,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    producer.join().unwrap();
    assert_eq!(collected, payload);
}

#[test]
fn lockfree_write_path_fifo() {
    check_write_path_fifo(lockfree);
}

#[test]
fn locking_write_path_fifo() {
    check_write_path_fifo(locking);
}

// --- close unblocks waiters and is idempotent --------------------------

fn check_close_unblocks_reader(make: Factory) {
    let ring = make(4096);

    let reader = {
        let ring = Arc::clone(&ring);
        thread::spawn(move || {
            let mut p = [0u8; 64];
            ring.read(&mut p)
        })
    };

    thread::sleep(Duration::from_millis(20));
    ring.close();
    ring.close();

    assert!(matches!(reader.join().unwrap(), Err(SluiceError::Closed)));
    assert!(matches!(ring.commit(1), Err(SluiceError::InsufficientData { .. })));
}

#[test]
fn lockfree_close_unblocks_reader() {
    check_close_unblocks_reader(lockfree);
}

#[test]
fn locking_close_unblocks_reader() {
    check_close_unblocks_reader(locking);
}

fn check_close_unblocks_writer(make: Factory) {
    let ring = make(4096);
    ring.write(&vec![0u8; 4096]).unwrap();

    let writer = {
        let ring = Arc::clone(&ring);
        thread::spawn(move || ring.write(&[0u8; 1024]))
    };

    thread::sleep(Duration::from_millis(20));
    ring.close();

    assert!(matches!(writer.join().unwrap(), Err(SluiceError::Closed)));
}

#[test]
fn lockfree_close_unblocks_writer() {
    check_close_unblocks_writer(lockfree);
}

#[test]
fn locking_close_unblocks_writer() {
    check_close_unblocks_writer(locking);
}

// --- capacity errors ----------------------------------------------------

fn check_capacity_errors(make: Factory) {
    let ring = make(4096);

    assert!(matches!(
        ring.peek(8192),
        Err(SluiceError::ExceedsCapacity { requested: 8192, capacity: 4096 })
    ));
    assert!(matches!(
        ring.commit(8192),
        Err(SluiceError::ExceedsCapacity { .. })
    ));
    assert!(matches!(
        ring.write(&vec![0u8; 8192]),
        Err(SluiceError::ExceedsCapacity { .. })
    ));
}

#[test]
fn lockfree_capacity_errors() {
    check_capacity_errors(lockfree);
}

#[test]
fn locking_capacity_errors() {
    check_capacity_errors(locking);
}

// --- ids are unique across variants ------------------------------------

#[test]
fn buffer_ids_are_unique() {
    let a = lockfree(4096);
    let b = locking(4096);
    let c = lockfree(4096);

    assert_ne!(a.id(), b.id());
    assert_ne!(b.id(), c.id());
    assert_ne!(a.id(), c.id());
}
