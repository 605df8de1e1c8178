//! TOML configuration file support.
//!
//! Settings that would otherwise take many flags can live in a file:
//!
//! ```toml
//! # pico.toml
//! [conversion]
//! mode = "ms1-profile"
//! uncertainty = 0.02
//! uncertainty_scaling = "linear"
//! end_uncertainty = 0.05
//! top_k = 200
//! parallel = true
//! ```
//!
//! Flags given on the command line win over the file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use pico::centroid::UncertaintyScaling;
use pico::reader::{CentroidProcessing, ReaderConfig};

/// Root configuration structure for pico.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Conversion-specific settings.
    #[serde(default)]
    pub conversion: ConversionConfig,
}

/// Configuration for the convert command.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConversionConfig {
    /// Peak routing mode.
    pub mode: Option<CentroidProcessing>,

    /// Gaussian sigma at the low end of a scan.
    pub uncertainty: Option<f64>,

    /// Gaussian sigma at the high end (linear scaling only).
    pub end_uncertainty: Option<f64>,

    /// How sigma varies across a scan.
    pub uncertainty_scaling: Option<UncertaintyScaling>,

    /// Keep only the K most intense centroids.
    pub top_k: Option<usize>,

    /// Merge radius in m/z.
    pub merge_radius: Option<f64>,

    /// Report raw apex intensities.
    pub adjust_intensity: Option<bool>,

    /// Re-insert stripped zero points before centroiding.
    pub restore_zeros: Option<bool>,

    /// Require a zero-free first scan for the Type1-6 probe.
    pub expect_no_zeros: Option<bool>,

    /// Run the integrity pre-flight.
    pub check_integrity: Option<bool>,

    /// Decode functions in parallel.
    pub parallel: Option<bool>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}

impl ConversionConfig {
    /// Copy the settings present in the file onto `config`.
    pub fn apply(&self, config: &mut ReaderConfig) {
        if let Some(mode) = self.mode {
            config.centroid_processing = mode;
        }
        let options = &mut config.centroid_options;
        if let Some(uncertainty) = self.uncertainty {
            options.uncertainty = uncertainty;
            options.end_uncertainty = uncertainty;
            options.merge_radius = 4.0 * uncertainty;
        }
        if let Some(end) = self.end_uncertainty {
            options.end_uncertainty = end;
        }
        if let Some(scaling) = self.uncertainty_scaling {
            options.uncertainty_scaling = scaling;
        }
        if self.top_k.is_some() {
            options.top_k = self.top_k;
        }
        if let Some(radius) = self.merge_radius {
            options.merge_radius = radius;
        }
        if let Some(adjust) = self.adjust_intensity {
            options.adjust_intensity = adjust;
        }
        if let Some(restore) = self.restore_zeros {
            config.restore_zeros = restore;
        }
        if let Some(expect) = self.expect_no_zeros {
            config.expect_no_zeros = expect;
        }
        if let Some(check) = self.check_integrity {
            config.check_integrity = check;
        }
        if let Some(parallel) = self.parallel {
            config.parallel = parallel;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [conversion]
            mode = "ms1-profile"
            uncertainty = 0.02
            uncertainty_scaling = "linear"
            end_uncertainty = 0.05
            top_k = 200
            parallel = true
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.conversion.mode, Some(CentroidProcessing::Ms1Profile));
        assert_eq!(config.conversion.uncertainty, Some(0.02));
        assert_eq!(
            config.conversion.uncertainty_scaling,
            Some(UncertaintyScaling::Linear)
        );
        assert_eq!(config.conversion.top_k, Some(200));
        assert_eq!(config.conversion.parallel, Some(true));
    }

    #[test]
    fn test_apply_overrides_only_present_fields() {
        let config = Config::from_str("[conversion]\nuncertainty = 0.02\nend_uncertainty = 0.05\n").unwrap();
        let mut reader = ReaderConfig::default();
        config.conversion.apply(&mut reader);
        assert_eq!(reader.centroid_processing, CentroidProcessing::Msn);
        assert_eq!(reader.centroid_options.uncertainty, 0.02);
        assert_eq!(reader.centroid_options.end_uncertainty, 0.05);
        assert_eq!(reader.centroid_options.merge_radius, 4.0 * 0.02);
        assert!(reader.check_integrity);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(Config::from_str("[conversion]\ncompression_level = 3\n").is_err());
    }

    #[test]
    fn test_empty_config() {
        let config = Config::from_str("").unwrap();
        assert!(config.conversion.mode.is_none());
    }
}
