//! Conversion options.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::byspec2::{
    CompressionInfoRow, CENTROID_COMPRESSION_ID, PROFILE_COMPRESSION_ID, SCHEMA_VERSION,
    UNCOMPRESSED_ID,
};
use crate::centroid::CentroidOptions;

use super::error::ReaderError;

/// Where profile and centroid peaks go, and whether they are compressed.
///
/// The numeric codes 0-6 are the ones recorded in `FilesInfo`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CentroidProcessing {
    /// 0: centroid everything, raw blobs
    AllUncompressed,
    /// 1: centroid everything, compressed
    All,
    /// 2: keep profile at every level, with a centroided survey companion
    Ms1Profile,
    /// 3: like `Ms1Profile`, raw blobs
    Ms1ProfileUncompressed,
    /// 4: profile survey scans, centroided fragment scans
    #[default]
    Msn,
    /// 5: like `Msn`, raw blobs
    MsnUncompressed,
    /// 6: compressed profile everywhere, with centroided companions
    TestProfileCompression,
}

impl CentroidProcessing {
    /// Returns all available mode names, in code order.
    pub fn variants() -> &'static [&'static str] {
        &[
            "all-uncompressed",
            "all",
            "ms1-profile",
            "ms1-profile-uncompressed",
            "msn",
            "msn-uncompressed",
            "test-profile-compression",
        ]
    }

    /// Numeric mode code.
    pub fn code(&self) -> u8 {
        match self {
            CentroidProcessing::AllUncompressed => 0,
            CentroidProcessing::All => 1,
            CentroidProcessing::Ms1Profile => 2,
            CentroidProcessing::Ms1ProfileUncompressed => 3,
            CentroidProcessing::Msn => 4,
            CentroidProcessing::MsnUncompressed => 5,
            CentroidProcessing::TestProfileCompression => 6,
        }
    }

    /// Mode for a numeric code.
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => CentroidProcessing::AllUncompressed,
            1 => CentroidProcessing::All,
            2 => CentroidProcessing::Ms1Profile,
            3 => CentroidProcessing::Ms1ProfileUncompressed,
            4 => CentroidProcessing::Msn,
            5 => CentroidProcessing::MsnUncompressed,
            6 => CentroidProcessing::TestProfileCompression,
            _ => return None,
        })
    }

    /// Profile peaks are stored as profile at this level.
    pub fn keeps_profile(&self, ms_level: i32) -> bool {
        match self {
            CentroidProcessing::Ms1Profile
            | CentroidProcessing::Ms1ProfileUncompressed
            | CentroidProcessing::TestProfileCompression => true,
            CentroidProcessing::Msn | CentroidProcessing::MsnUncompressed => ms_level == 1,
            CentroidProcessing::AllUncompressed | CentroidProcessing::All => false,
        }
    }

    /// A stored profile scan also gets a `Peaks_MS1Centroided` row.
    pub fn writes_centroided_companion(&self, ms_level: i32) -> bool {
        match self {
            CentroidProcessing::TestProfileCompression => true,
            CentroidProcessing::Ms1Profile
            | CentroidProcessing::Ms1ProfileUncompressed
            | CentroidProcessing::Msn
            | CentroidProcessing::MsnUncompressed => ms_level == 1,
            CentroidProcessing::AllUncompressed | CentroidProcessing::All => false,
        }
    }

    fn compresses_profile(&self) -> bool {
        matches!(
            self,
            CentroidProcessing::Ms1Profile
                | CentroidProcessing::Msn
                | CentroidProcessing::TestProfileCompression
        )
    }

    fn compresses_centroid(&self) -> bool {
        matches!(
            self,
            CentroidProcessing::All
                | CentroidProcessing::Ms1Profile
                | CentroidProcessing::Msn
                | CentroidProcessing::TestProfileCompression
        )
    }

    /// `CompressionInfoId` of stored profile peaks.
    pub fn profile_codec(&self) -> i64 {
        if self.compresses_profile() {
            PROFILE_COMPRESSION_ID
        } else {
            UNCOMPRESSED_ID
        }
    }

    /// `CompressionInfoId` of stored centroid peaks.
    pub fn centroid_codec(&self) -> i64 {
        if self.compresses_centroid() {
            CENTROID_COMPRESSION_ID
        } else {
            UNCOMPRESSED_ID
        }
    }

    /// `CompressionInfo` rows for every codec id this mode can reference.
    pub fn compression_info_rows(&self) -> Vec<CompressionInfoRow> {
        let mut ids = Vec::new();
        let profile_stored = *self != CentroidProcessing::All && *self != CentroidProcessing::AllUncompressed;
        if profile_stored {
            ids.push(self.profile_codec());
        }
        ids.push(self.centroid_codec());
        ids.sort_unstable();
        ids.dedup();
        ids.into_iter()
            .map(|id| CompressionInfoRow {
                id,
                property: codec_property(id).to_string(),
                version: SCHEMA_VERSION.to_string(),
            })
            .collect()
    }
}

fn codec_property(id: i64) -> &'static str {
    match id {
        PROFILE_COMPRESSION_ID => "pico:reader:waters:profile",
        CENTROID_COMPRESSION_ID => "pico:reader:waters:centroid",
        _ => "pico:reader:waters:uncompressed",
    }
}

impl fmt::Display for CentroidProcessing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Self::variants()[self.code() as usize])
    }
}

impl FromStr for CentroidProcessing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        if let Some(mode) = lower.parse::<u8>().ok().and_then(Self::from_code) {
            return Ok(mode);
        }
        Self::variants()
            .iter()
            .position(|name| *name == lower)
            .and_then(|i| Self::from_code(i as u8))
            .ok_or_else(|| {
                format!(
                    "Unknown mode '{}'. Valid options: {}",
                    s,
                    Self::variants().join(", ")
                )
            })
    }
}

/// Options of one conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReaderConfig {
    /// Profile/centroid routing
    pub centroid_processing: CentroidProcessing,
    /// Centroiding parameters
    pub centroid_options: CentroidOptions,
    /// Type1-6 probe requires a zero-free first scan
    pub expect_no_zeros: bool,
    /// Re-insert the zero points stripped from profile scans before centroiding
    pub restore_zeros: bool,
    /// Run the integrity check before converting
    pub check_integrity: bool,
    /// Decode functions on the rayon pool (needs the `parallel` feature)
    pub parallel: bool,
    /// Decoded functions buffered between decoding and the writer
    pub channel_capacity: usize,
    /// Scans between progress reports
    pub progress_interval: usize,
    /// Invocation arguments recorded in `FilesInfo`
    pub argv: Vec<String>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            centroid_processing: CentroidProcessing::default(),
            centroid_options: CentroidOptions::default(),
            expect_no_zeros: true,
            restore_zeros: false,
            check_integrity: true,
            parallel: false,
            channel_capacity: 4,
            progress_interval: 1000,
            argv: Vec::new(),
        }
    }
}

impl ReaderConfig {
    /// Reject option sets that cannot run.
    pub fn validate(&self) -> Result<(), ReaderError> {
        self.centroid_options.validate()?;
        if self.channel_capacity == 0 {
            return Err(ReaderError::BadParameter(
                "channel capacity must be at least 1".to_string(),
            ));
        }
        if self.progress_interval == 0 {
            return Err(ReaderError::BadParameter(
                "progress interval must be at least 1".to_string(),
            ));
        }
        if self.parallel && !cfg!(feature = "parallel") {
            return Err(ReaderError::BadParameter(
                "parallel decoding requires the `parallel` feature".to_string(),
            ));
        }
        Ok(())
    }

    /// Effective options as recorded in the `options` row of `FilesInfo`.
    pub fn options_string(&self) -> String {
        let o = &self.centroid_options;
        format!(
            "centroid={} uncertainty={} scaling={} top_k={} merge_radius={} adjust_intensity={} expect_no_zeros={} restore_zeros={}",
            self.centroid_processing.code(),
            o.uncertainty,
            o.uncertainty_scaling,
            o.top_k.map_or_else(|| "none".to_string(), |k| k.to_string()),
            o.merge_radius,
            o.adjust_intensity,
            self.expect_no_zeros,
            self.restore_zeros
        )
    }
}
