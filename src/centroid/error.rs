//! Error types for centroiding and peak compression.

use thiserror::Error;

/// Errors raised by the centroider and the peak codec.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CentroidError {
    /// Invalid caller-supplied option
    #[error("Bad centroid parameter: {0}")]
    BadParameter(String),

    /// Compressed blob could not be decoded
    #[error("Corrupt compressed peaks: {0}")]
    Corrupt(String),
}
