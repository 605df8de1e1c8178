//! # byspec2 Output
//!
//! A byspec2 file is a SQLite database with eight tables:
//!
//! | Table | Content |
//! |-------|---------|
//! | `Files` | one row per converted source |
//! | `FilesInfo` | key/value bag: arguments, options, calibration, `Version` |
//! | `Info` | acquisition metadata from `_extern.inf` and `_INLET.INF` |
//! | `Spectra` | one row per scan, `PeaksId` pointing into `Peaks` |
//! | `Peaks` | m/z and intensity blobs, count, intensity sum, codec tag |
//! | `Peaks_MS1Centroided` | centroided companion rows of profile survey scans |
//! | `CompressionInfo` | codec tags referenced by the peak rows |
//! | `Chromatogram` | TIC and detector traces |
//!
//! Uncompressed blobs are little-endian `f64` (m/z, times) and `f32`
//! (intensities, trace values).
//!
//! ## Example
//!
//! ```
//! use pico::byspec2::{Byspec2Writer, FileRow};
//!
//! let mut writer = Byspec2Writer::open_in_memory()?;
//! writer.add_file(&FileRow { filename: "run.raw".into(), ..Default::default() })?;
//! writer.add_files_info(&[("Version".to_string(), "1.0.1".to_string())])?;
//! let stats = writer.finish()?;
//! assert_eq!(stats.spectra_written, 0);
//! # Ok::<(), pico::byspec2::Byspec2Error>(())
//! ```

mod error;
mod schema;
mod stats;
mod types;
mod writer;

#[cfg(test)]
mod tests;

pub use error::Byspec2Error;
pub use schema::{create_schema, schema_sql, table_columns, SCHEMA_VERSION, TABLES};
pub use stats::WriterStats;
pub use types::{
    CompressionInfoRow, FileRow, ParentLink, PeaksRow, ScanRow, SpectrumKey, SpectrumRow,
    CENTROID_COMPRESSION_ID, PROFILE_COMPRESSION_ID, UNCOMPRESSED_ID,
};
pub use writer::{Byspec2Writer, CHROMATOGRAM_META_TEXT};
