//! Observability hooks for ring buffer operations.
//!
//! Zero-cost when disabled. Enable the `tracing` cargo feature to emit
//! spans through the `tracing` crate; install any subscriber
//! (`tracing_subscriber::fmt::init()`) in the host application to see
//! them. Without the feature every hook compiles to an empty inline
//! function.

/// Record a write into the ring
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn record_write(id: u32, bytes: usize) {
    let _span = tracing::trace_span!("write", id, bytes).entered();
}

#[cfg(not(feature = "tracing"))]
#[inline(always)]
pub(crate) fn record_write(_id: u32, _bytes: usize) {}

/// Record a read out of the ring
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn record_read(id: u32, bytes: usize) {
    let _span = tracing::trace_span!("read", id, bytes).entered();
}

#[cfg(not(feature = "tracing"))]
#[inline(always)]
pub(crate) fn record_read(_id: u32, _bytes: usize) {}

/// Record a producer stall on the gate
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn record_producer_wait(id: u32) {
    let _span = tracing::trace_span!("producer_wait", id).entered();
}

#[cfg(not(feature = "tracing"))]
#[inline(always)]
pub(crate) fn record_producer_wait(_id: u32) {}

/// Record a consumer stall on an empty ring
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn record_consumer_wait(id: u32) {
    let _span = tracing::trace_span!("consumer_wait", id).entered();
}

#[cfg(not(feature = "tracing"))]
#[inline(always)]
pub(crate) fn record_consumer_wait(_id: u32) {}

/// Record the close latch being set
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn record_close(id: u32) {
    let _span = tracing::debug_span!("close", id).entered();
}

#[cfg(not(feature = "tracing"))]
#[inline(always)]
pub(crate) fn record_close(_id: u32) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hooks_compile() {
        // No-ops when the tracing feature is disabled.
        record_write(1, 100);
        record_read(1, 100);
        record_producer_wait(1);
        record_consumer_wait(1);
        record_close(1);
    }
}
