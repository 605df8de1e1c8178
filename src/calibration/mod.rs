//! Per-function m/z calibration from `_HEADER.TXT`.
//!
//! Each `$$ Cal Function N:` line carries up to six coefficients and a `T{d}`
//! type tag. A `$$ Cal Modification N:` line adds a second polynomial applied
//! to the calibrated value (`T0` plain, `T1` square-root form).
//!
//! # Example
//!
//! ```
//! use pico::calibration::CalibrationTable;
//!
//! let table = CalibrationTable::parse(
//!     "$$ Cal Function 1: 0.0,1.0,0,0,0,0,T1\r\n$$ Cal Function 2: 1,0,0,0,0,0,T1\r\n",
//! );
//! let cal = table.for_function(2, 1, false).unwrap();
//! assert_eq!(cal.apply(445.12), 445.12);
//! ```

mod error;
mod header;
mod polynomial;

#[cfg(test)]
mod tests;

pub use error::CalibrationError;
pub use header::{CalibrationTable, CoefficientSet, HEADER_FILE};
pub use polynomial::{Calibration, FunctionCalibration, Modification, CALIBRATION_TERMS};
