//! Centroiding options.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::CentroidError;

/// How the smoothing width varies with m/z.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UncertaintyScaling {
    /// Same width everywhere.
    #[default]
    Constant,
    /// Width grows with the square root of m/z (not supported).
    SquareRoot,
    /// Width interpolated linearly from the first to the last point.
    Linear,
}

impl UncertaintyScaling {
    /// Returns all available names.
    pub fn variants() -> &'static [&'static str] {
        &["constant", "square-root", "linear"]
    }
}

impl fmt::Display for UncertaintyScaling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UncertaintyScaling::Constant => write!(f, "constant"),
            UncertaintyScaling::SquareRoot => write!(f, "square-root"),
            UncertaintyScaling::Linear => write!(f, "linear"),
        }
    }
}

impl FromStr for UncertaintyScaling {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "constant" => Ok(UncertaintyScaling::Constant),
            "square-root" | "sqrt" => Ok(UncertaintyScaling::SquareRoot),
            "linear" => Ok(UncertaintyScaling::Linear),
            _ => Err(format!(
                "Unknown uncertainty scaling '{}'. Valid options: {}",
                s,
                UncertaintyScaling::variants().join(", ")
            )),
        }
    }
}

/// Parameters of the smoothing and peak picking step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CentroidOptions {
    /// Gaussian sigma at the low end of the scan, in m/z.
    pub uncertainty: f64,
    /// Gaussian sigma at the high end (only used with [`UncertaintyScaling::Linear`]).
    pub end_uncertainty: f64,
    /// Sigma scaling mode.
    pub uncertainty_scaling: UncertaintyScaling,
    /// Keep only the K most intense peaks.
    pub top_k: Option<usize>,
    /// Weaker maxima within this m/z distance of a stronger one are dropped.
    pub merge_radius: f64,
    /// Replace smoothed apex intensities with the raw local maximum.
    pub adjust_intensity: bool,
    /// Sort the output by m/z.
    pub sort_mz: bool,
}

impl Default for CentroidOptions {
    fn default() -> Self {
        Self::with_uncertainty(0.01)
    }
}

impl CentroidOptions {
    /// Options for a given sigma, merge radius four sigma wide.
    pub fn with_uncertainty(uncertainty: f64) -> Self {
        Self {
            uncertainty,
            end_uncertainty: uncertainty,
            uncertainty_scaling: UncertaintyScaling::Constant,
            top_k: None,
            merge_radius: 4.0 * uncertainty,
            adjust_intensity: false,
            sort_mz: false,
        }
    }

    /// Check the option set before any scan is processed.
    pub fn validate(&self) -> Result<(), CentroidError> {
        if !(self.uncertainty > 0.0) || !self.uncertainty.is_finite() {
            return Err(CentroidError::BadParameter(format!(
                "uncertainty must be positive, got {}",
                self.uncertainty
            )));
        }
        if self.uncertainty_scaling == UncertaintyScaling::Linear && !(self.end_uncertainty > 0.0) {
            return Err(CentroidError::BadParameter(format!(
                "end uncertainty must be positive, got {}",
                self.end_uncertainty
            )));
        }
        if self.uncertainty_scaling == UncertaintyScaling::SquareRoot {
            return Err(CentroidError::BadParameter(
                "square-root uncertainty scaling is not supported".to_string(),
            ));
        }
        if self.merge_radius < 0.0 {
            return Err(CentroidError::BadParameter(format!(
                "merge radius must not be negative, got {}",
                self.merge_radius
            )));
        }
        if self.top_k == Some(0) {
            return Err(CentroidError::BadParameter("top_k must be at least 1".to_string()));
        }
        Ok(())
    }
}
