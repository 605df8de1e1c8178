//! # pico - Waters Raw Decoding and byspec2 Output
//!
//! `pico` reads Waters `.raw` acquisition directories and writes their spectra,
//! chromatograms and acquisition metadata into byspec2, a SQLite database with a
//! fixed eight-table schema.
//!
//! ## Key Features
//!
//! - **All three packed encodings**: Type1, Type1-6 and V3C points are probed per
//!   function and normalized to one representation before calibration.
//!
//! - **Function classification with a trace**: MS levels come from `_FUNCTNS.INF`
//!   or `_extern.inf`, MSE runs are recognised, and every level decision records
//!   the rule that made it.
//!
//! - **Calibration**: `_HEADER.TXT` polynomials and modifications are applied to
//!   every decoded m/z.
//!
//! - **Centroiding and compact peaks**: profile scans can be centroided with a
//!   Gaussian smoother and stored as delta-encoded blobs.
//!
//! - **Fail-soft scans, fail-hard runs**: one broken scan becomes an invalid row;
//!   a broken run leaves no output file at all.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pico::reader::WatersConverter;
//!
//! let stats = WatersConverter::new().convert("sample.raw", "sample.byspec2")?;
//! println!("{}", stats);
//! # Ok::<(), pico::reader::ReaderError>(())
//! ```
//!
//! Random access to single scans goes through [`reader::WatersSource`]:
//!
//! ```rust,no_run
//! use pico::peaks::PeakArrays;
//! use pico::reader::{ReaderConfig, ScanSource, WatersSource};
//!
//! let mut source = WatersSource::new("sample.raw", ReaderConfig::default());
//! source.open()?;
//! let mut peaks = PeakArrays::default();
//! for index in 0..source.scan_count() {
//!     let info = source.scan_info(index)?;
//!     source.scan_data(index, &mut peaks)?;
//!     println!("{} level {} with {} points", info.native_id, info.ms_level, peaks.len());
//! }
//! source.close();
//! # Ok::<(), pico::reader::ReaderError>(())
//! ```
//!
//! ## Reading byspec2 Files
//!
//! The output is plain SQLite:
//!
//! ```sql
//! SELECT s.NativeId, s.RetentionTime, p.PeaksCount
//! FROM Spectra s JOIN Peaks p ON p.Id = s.PeaksId
//! WHERE s.MSLevel = 2 AND s.ObservedMz BETWEEN 500 AND 600;
//! ```
//!
//! ## Architecture
//!
//! - [`codec`]: packed point decoding (m/z bands, intensity scales, V3C, zero restoration)
//! - [`centroid`]: Gaussian centroiding and the compressed peak blob format
//! - [`calibration`]: `_HEADER.TXT` calibration polynomials
//! - [`classify`]: function MS levels, roles and MSE detection
//! - [`raw`]: IDX/DAT/STS scanning, layout probes and detector traces
//! - [`integrity`]: pre-flight presence and consistency check
//! - [`byspec2`]: the SQLite schema and writer
//! - [`reader`]: the conversion pipelines and random-access source

#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
// Allow some patterns common in decoder code
#![allow(clippy::too_many_arguments)]

pub mod byspec2;
pub mod calibration;
pub mod centroid;
pub mod classify;
pub mod codec;
pub mod integrity;
pub mod peaks;
pub mod raw;
pub mod reader;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::byspec2::{Byspec2Error, Byspec2Writer};
    pub use crate::centroid::{centroid, CentroidOptions, UncertaintyScaling};
    pub use crate::classify::{classify_dir, Classification, FunctionRole};
    pub use crate::integrity::{check_integrity, IntegrityReport, IntegrityResult};
    pub use crate::peaks::PeakArrays;
    pub use crate::reader::{
        CancellationToken, CentroidProcessing, ConversionStats, ReaderConfig, ReaderError,
        ScanSource, WatersConverter, WatersSource,
    };
}
