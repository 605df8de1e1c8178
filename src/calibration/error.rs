//! Error types for calibration parsing.

use thiserror::Error;

/// Errors raised while reading `_HEADER.TXT` calibration lines.
#[derive(Error, Debug)]
pub enum CalibrationError {
    /// Malformed coefficient list or header line
    #[error("Calibration parse error: {0}")]
    ParseError(String),

    /// More than six coefficients on one line
    #[error("Too many calibration coefficients: {0}")]
    TooManyCoefficients(usize),

    /// Generic I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
