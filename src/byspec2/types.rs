//! Row types handed to [`super::Byspec2Writer`].

use serde::Serialize;

use crate::peaks::PeakArrays;

/// `CompressionInfoId` of raw little-endian blobs.
pub const UNCOMPRESSED_ID: i64 = 2;
/// `CompressionInfoId` of compressed profile blobs.
pub const PROFILE_COMPRESSION_ID: i64 = 3;
/// `CompressionInfoId` of compressed centroid blobs.
pub const CENTROID_COMPRESSION_ID: i64 = 4;

/// One `Files` row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileRow {
    /// Base name of the source
    pub filename: String,
    /// Directory holding the source
    pub location: String,
    /// Source format tag
    pub file_type: String,
    /// Free-form signature
    pub signature: Option<String>,
}

/// One `Peaks` or `Peaks_MS1Centroided` row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeaksRow {
    /// Encoded m/z array
    pub mz: Vec<u8>,
    /// Encoded intensity array
    pub intensity: Vec<u8>,
    /// Number of peaks
    pub count: usize,
    /// Sum of all intensities
    pub intensity_sum: f64,
    /// Codec tag
    pub compression_info_id: i64,
    /// Free-form comment
    pub comment: Option<String>,
}

impl PeaksRow {
    /// Raw `f64`/`f32` little-endian blobs.
    pub fn uncompressed(peaks: &PeakArrays) -> Self {
        Self {
            mz: peaks.mz_blob(),
            intensity: peaks.intensity_blob(),
            count: peaks.len(),
            intensity_sum: peaks.intensity_sum(),
            compression_info_id: UNCOMPRESSED_ID,
            comment: None,
        }
    }

    /// Placeholder for a scan that could not be decoded.
    pub fn empty() -> Self {
        Self {
            compression_info_id: UNCOMPRESSED_ID,
            ..Self::default()
        }
    }
}

/// One `Spectra` row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpectrumRow {
    /// MS level (9 for the lock-mass channel)
    pub ms_level: i32,
    /// Precursor m/z
    pub observed_mz: Option<f64>,
    /// Isolation window below the precursor
    pub isolation_lower: Option<f64>,
    /// Isolation window above the precursor
    pub isolation_upper: Option<f64>,
    /// Retention time in seconds
    pub retention_time: f64,
    /// Run-wide 1-based scan number, also the `Peaks` id
    pub scan_number: i64,
    /// `function=F process=0 scan=S`
    pub native_id: String,
    /// Precursor charges
    pub charge_list: Option<String>,
    /// Precursor intensity
    pub precursor_intensity: Option<f64>,
    /// Fragmentation method
    pub fragmentation_type: Option<String>,
    /// Error text of an invalid scan
    pub comment: Option<String>,
    /// XML-ish tags (`RetentionTimeUnit`, `PeakMode`, `Calibration`)
    pub meta_text: Option<String>,
    /// Diagnostics
    pub debug_text: Option<String>,
    /// False when the scan failed to decode
    pub valid: bool,
}

/// A spectrum with its peak rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRow {
    /// `Spectra` row
    pub spectrum: SpectrumRow,
    /// `Peaks` row, stored under `spectrum.scan_number`
    pub peaks: PeaksRow,
    /// Optional `Peaks_MS1Centroided` row with the same id
    pub centroided: Option<PeaksRow>,
}

/// One `CompressionInfo` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompressionInfoRow {
    /// Id referenced by `CompressionInfoId`
    pub id: i64,
    /// Property string identifying the codec
    pub property: String,
    /// Codec version
    pub version: String,
}

/// Ordering key of a stored spectrum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpectrumKey {
    /// `Spectra.Id`
    pub id: i64,
    /// MS level
    pub ms_level: i32,
    /// Run-wide scan number
    pub scan_number: i64,
    /// Native id
    pub native_id: String,
}

/// Parent assignment of one spectrum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentLink {
    /// `Spectra.Id` of the child
    pub id: i64,
    /// Scan number of the parent
    pub parent_scan_number: i64,
    /// Native id of the parent
    pub parent_native_id: String,
}
