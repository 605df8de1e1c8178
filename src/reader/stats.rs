use std::fmt;

use serde::Serialize;

/// Statistics of a completed conversion
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionStats {
    /// Spectra rows written
    pub spectra_count: usize,
    /// Peaks stored in `Peaks`
    pub peak_count: usize,
    /// Survey spectra
    pub ms1_spectra: usize,
    /// Fragment spectra at level 2
    pub ms2_spectra: usize,
    /// Fragment spectra at level 3 to 8
    pub msn_spectra: usize,
    /// Lock-mass spectra
    pub calibration_spectra: usize,
    /// Scans stored as invalid
    pub scan_errors: usize,
    /// Spectra given a parent scan
    pub parents_linked: usize,
    /// Chromatogram rows written
    pub chromatograms: usize,
    /// Functions decoded
    pub functions_converted: usize,
    /// Functions left out, with the reason
    pub functions_skipped: Vec<(u32, String)>,
    /// Output file size in bytes
    pub output_file_size: u64,
}

impl ConversionStats {
    /// Count one spectrum at `ms_level`.
    pub fn count_spectrum(&mut self, ms_level: i32, peaks: usize) {
        self.spectra_count += 1;
        self.peak_count += peaks;
        match ms_level {
            1 => self.ms1_spectra += 1,
            2 => self.ms2_spectra += 1,
            9 => self.calibration_spectra += 1,
            _ => self.msn_spectra += 1,
        }
    }

    /// `FilesInfo` value for the `ScanErrors` key, when any scan failed.
    pub fn scan_errors_message(&self) -> Option<String> {
        (self.scan_errors > 0).then(|| format!("{} scan(s) with errors.", self.scan_errors))
    }
}

impl fmt::Display for ConversionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Converted {} spectra ({} MS1, {} MS2, {} MSn, {} lock mass; {} peaks) and {} chromatograms",
            self.spectra_count,
            self.ms1_spectra,
            self.ms2_spectra,
            self.msn_spectra,
            self.calibration_spectra,
            self.peak_count,
            self.chromatograms
        )?;
        if self.scan_errors > 0 {
            write!(f, "; {} scan(s) with errors", self.scan_errors)?;
        }
        Ok(())
    }
}
