//! Sluice buffer constants.
//!
//! Core constants shared by both ring buffer implementations.

/// Default ring capacity when a size of 0 is requested (1 MiB)
pub const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;

/// Contiguous region reserved per `read_from` iteration
pub const DEFAULT_READ_BLOCK: usize = 1024;

/// Bytes peeked per `write_to` iteration
pub const DEFAULT_WRITE_BLOCK: usize = 2048;

/// Minimum ring capacity (two full read blocks)
pub const MIN_BUFFER_SIZE: usize = 2 * DEFAULT_READ_BLOCK;

/// Cache line size for sequence padding (64 bytes on most CPUs)
pub const CACHE_LINE_SIZE: usize = 64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_sizes_are_powers_of_two() {
        assert!(DEFAULT_BUFFER_SIZE.is_power_of_two());
        assert!(MIN_BUFFER_SIZE.is_power_of_two());
    }

    #[test]
    fn test_default_size_holds_both_blocks() {
        assert!(DEFAULT_BUFFER_SIZE >= MIN_BUFFER_SIZE);
        assert!(MIN_BUFFER_SIZE >= DEFAULT_WRITE_BLOCK);
    }

    #[test]
    fn test_cache_line_size_is_power_of_two() {
        assert!(CACHE_LINE_SIZE.is_power_of_two());
    }
}
