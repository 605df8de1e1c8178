//! Structure-of-arrays peak storage shared by the decoder, centroider and writer.

/// SoA peak storage for a single scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeakArrays {
    /// Mass-to-charge ratios (Float64).
    pub mz: Vec<f64>,
    /// Peak intensities (Float32).
    pub intensity: Vec<f32>,
}

impl PeakArrays {
    /// Create a new peak array set.
    pub fn new(mz: Vec<f64>, intensity: Vec<f32>) -> Self {
        Self { mz, intensity }
    }

    /// Create an empty set with room for `n` peaks.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            mz: Vec::with_capacity(n),
            intensity: Vec::with_capacity(n),
        }
    }

    /// Append one peak.
    pub fn push(&mut self, mz: f64, intensity: f32) {
        self.mz.push(mz);
        self.intensity.push(intensity);
    }

    /// Returns the number of peaks.
    pub fn len(&self) -> usize {
        self.mz.len()
    }

    /// Returns true if there are no peaks.
    pub fn is_empty(&self) -> bool {
        self.mz.is_empty()
    }

    /// Remove every peak, keeping the allocation.
    pub fn clear(&mut self) {
        self.mz.clear();
        self.intensity.clear();
    }

    /// Validate that both arrays have matching lengths.
    pub fn validate(&self) -> Result<(), String> {
        if self.intensity.len() != self.mz.len() {
            return Err(format!(
                "intensity length {} does not match mz length {}",
                self.intensity.len(),
                self.mz.len()
            ));
        }
        Ok(())
    }

    /// Sum of all intensities.
    pub fn intensity_sum(&self) -> f64 {
        self.intensity.iter().map(|&v| v as f64).sum()
    }

    /// Iterate over `(mz, intensity)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f32)> + '_ {
        self.mz.iter().copied().zip(self.intensity.iter().copied())
    }

    /// Little-endian `f64` blob of the m/z array.
    pub fn mz_blob(&self) -> Vec<u8> {
        f64_blob(&self.mz)
    }

    /// Little-endian `f32` blob of the intensity array.
    pub fn intensity_blob(&self) -> Vec<u8> {
        f32_blob(&self.intensity)
    }
}

/// Encode doubles as a little-endian blob.
pub fn f64_blob(values: &[f64]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 8);
    for &v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

/// Encode singles as a little-endian blob.
pub fn f32_blob(values: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 4);
    for &v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}
