//! Profile to centroid reduction and compact peak encoding.
//!
//! # Centroiding
//!
//! [`centroid`] smooths a profile scan with a Gaussian kernel whose sigma is the
//! configured m/z uncertainty, picks the local maxima of the smoothed trace, removes
//! weaker maxima inside the merge radius of a stronger one, optionally keeps only
//! the `top_k` most intense, and reports each apex at the three-point weighted m/z
//! with its smoothed intensity.
//!
//! Scans with fewer than [`MIN_CENTROID_POINTS`] samples are not smoothed; their
//! nonzero samples are returned as-is.
//!
//! # Compression
//!
//! [`compress`] and [`decompress`] encode an m/z/intensity pair of arrays with a
//! delta dictionary and exception lists; see the [`compress`] module docs for the
//! blob layout. Scans already in centroid form bypass the centroider but may still
//! be compressed.
//!
//! # Example
//!
//! ```
//! use pico::centroid::{centroid, compress, decompress, CentroidOptions};
//! use pico::peaks::PeakArrays;
//!
//! let mz: Vec<f64> = (0..40).map(|i| 500.0 + i as f64 * 0.005).collect();
//! let intensity: Vec<f32> = (0..40)
//!     .map(|i| 1000.0 * (-((i as f64 - 20.0) / 4.0).powi(2)).exp())
//!     .map(|v| if v < 1.0 { 0.0 } else { v as f32 })
//!     .collect();
//! let profile = PeakArrays::new(mz, intensity);
//!
//! let peaks = centroid(&profile, &CentroidOptions::default())?;
//! assert_eq!(peaks.len(), 1);
//!
//! let packed = compress(&profile)?;
//! let back = decompress(&packed.mz, &packed.intensity)?;
//! assert_eq!(back.len(), profile.len());
//! # Ok::<(), pico::centroid::CentroidError>(())
//! ```

pub mod compress;
mod config;
mod error;
mod smooth;

#[cfg(test)]
mod tests;

pub use compress::{
    compress, compress_with_quantum, decompress, CompressedPeaks, CompressionSummary,
    COMPRESSION_VERSION, DEFAULT_MZ_QUANTUM,
};
pub use config::{CentroidOptions, UncertaintyScaling};
pub use error::CentroidError;
pub use smooth::{centroid, MIN_CENTROID_POINTS};
