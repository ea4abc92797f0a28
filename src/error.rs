//! Error types and handling for the sluice library

use thiserror::Error;

/// Result type alias for sluice operations
pub type Result<T> = std::result::Result<T, SluiceError>;

/// Main error type for the sluice library
#[derive(Error, Debug)]
pub enum SluiceError {
    /// The buffer was closed while an operation was blocked, or no
    /// further progress is possible
    #[error("ring buffer closed")]
    Closed,

    /// Fewer bytes are buffered than the operation requires
    #[error("insufficient data: {available} of {requested} bytes buffered")]
    InsufficientData {
        /// Bytes currently buffered
        available: usize,
        /// Bytes the operation asked for
        requested: usize,
    },

    /// Request exceeds the total capacity of the ring
    #[error("request of {requested} bytes exceeds capacity of {capacity}")]
    ExceedsCapacity {
        /// Bytes the operation asked for
        requested: usize,
        /// Total ring capacity
        capacity: usize,
    },

    /// Constructor rejected a size that is not a power of two
    #[error("size {size} is not a power of two, try {suggested}")]
    NotPowerOfTwo {
        /// Rejected size
        size: usize,
        /// Next valid size
        suggested: usize,
    },

    /// Constructor rejected a size below the minimum
    #[error("size {size} is below the minimum, try {min}")]
    TooSmall {
        /// Rejected size
        size: usize,
        /// Smallest accepted size
        min: usize,
    },

    /// Source or sink error, with the bytes forwarded before it occurred
    #[error("I/O error after {completed} bytes: {source}")]
    Io {
        /// Bytes successfully forwarded before the error
        completed: u64,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl SluiceError {
    /// Check if this error is recoverable by retrying the operation
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InsufficientData { .. })
    }

    /// Check if this error signals the normal end of the stream
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::Closed)
    }
}
