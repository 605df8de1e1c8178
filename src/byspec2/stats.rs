use std::fmt;

use serde::Serialize;

/// Row counts of a completed byspec2 write
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriterStats {
    /// Rows in `Spectra`
    pub spectra_written: usize,
    /// Spectra stored with `Valid = 0`
    pub invalid_spectra: usize,
    /// Total number of peaks in `Peaks`
    pub peaks_written: usize,
    /// Rows in `Peaks_MS1Centroided`
    pub centroided_written: usize,
    /// Rows in `Chromatogram`
    pub chromatograms_written: usize,
    /// Spectra that received a parent scan
    pub parents_linked: usize,
}

impl fmt::Display for WriterStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Wrote {} spectra ({} peaks, {} invalid) and {} chromatograms",
            self.spectra_written, self.peaks_written, self.invalid_spectra, self.chromatograms_written
        )
    }
}
