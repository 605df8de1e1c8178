//! Error types for packed value decoding.

use thiserror::Error;

/// Errors raised while unpacking vendor words.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A nonzero Type1 m/z word fell outside the documented band table
    #[error("m/z word 0x{0:08X} outside the Type1 range")]
    MzOutOfRange(u32),

    /// A Type1-6 intensity scale nibble above the supported maximum
    #[error("unsupported Type1-6 intensity scale nibble {0}")]
    BadScaleNibble(u8),

    /// A record slice did not hold a whole number of points
    #[error("truncated record: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Bytes required
        expected: usize,
        /// Bytes available
        actual: usize,
    },
}
