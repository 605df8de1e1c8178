use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use pico::reader::{CentroidProcessing, ReaderConfig, WatersConverter};

use super::config::Config;
use super::default_output;

/// Arguments of the convert subcommand.
pub struct ConvertArgs {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub mode: Option<CentroidProcessing>,
    pub config: Option<PathBuf>,
    pub uncertainty: Option<f64>,
    pub top_k: Option<usize>,
    pub parallel: bool,
    pub no_check: bool,
    pub restore_zeros: bool,
}

/// Settings file first, then flags.
fn build_config(args: &ConvertArgs) -> Result<ReaderConfig> {
    let mut config = ReaderConfig {
        argv: std::env::args().collect(),
        ..Default::default()
    };
    if let Some(path) = &args.config {
        Config::from_file(path)?.conversion.apply(&mut config);
    }
    if let Some(mode) = args.mode {
        config.centroid_processing = mode;
    }
    if let Some(uncertainty) = args.uncertainty {
        let options = &mut config.centroid_options;
        options.uncertainty = uncertainty;
        options.end_uncertainty = uncertainty;
        options.merge_radius = 4.0 * uncertainty;
    }
    if args.top_k.is_some() {
        config.centroid_options.top_k = args.top_k;
    }
    if args.parallel {
        config.parallel = true;
    }
    if args.no_check {
        config.check_integrity = false;
    }
    if args.restore_zeros {
        config.restore_zeros = true;
    }
    Ok(config)
}

/// Convert a Waters .raw directory to byspec2
pub fn run(args: ConvertArgs) -> Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Input directory does not exist: {}", args.input.display());
    }
    if !args.input.is_dir() {
        anyhow::bail!("Input is not a .raw directory: {}", args.input.display());
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.input));
    let config = build_config(&args)?;

    info!("pico Converter - Waters raw to byspec2");
    info!("======================================");
    info!("Input:  {}", args.input.display());
    info!("Output: {}", output.display());
    info!(
        "Mode: {} ({})",
        config.centroid_processing,
        config.centroid_processing.code()
    );
    info!("Options: {}", config.options_string());
    if config.parallel {
        info!("Parallel decode: enabled");
    }

    let converter = WatersConverter::with_config(config);

    info!("Starting conversion...");
    let stats = converter
        .convert(&args.input, &output)
        .context("Conversion failed")?;

    info!("Conversion complete!");
    info!("  {}", stats);
    info!("  Functions converted: {}", stats.functions_converted);
    for (function, reason) in &stats.functions_skipped {
        info!("  Function {} skipped: {}", function, reason);
    }
    info!("  Parents linked: {}", stats.parents_linked);
    info!(
        "  Output file size: {} bytes ({:.2} MB)",
        stats.output_file_size,
        stats.output_file_size as f64 / 1024.0 / 1024.0
    );

    info!("\nFile can be read with any SQLite client:");
    info!(
        "  - sqlite3 {} 'SELECT COUNT(*) FROM Spectra'",
        output.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ConvertArgs {
        ConvertArgs {
            input: PathBuf::from("in.raw"),
            output: None,
            mode: None,
            config: None,
            uncertainty: None,
            top_k: None,
            parallel: false,
            no_check: false,
            restore_zeros: false,
        }
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pico.toml");
        std::fs::write(&path, "[conversion]\nmode = \"all\"\ntop_k = 10\n").unwrap();

        let mut a = args();
        a.config = Some(path);
        a.top_k = Some(25);
        a.uncertainty = Some(0.05);
        let config = build_config(&a).unwrap();
        assert_eq!(config.centroid_processing, CentroidProcessing::All);
        assert_eq!(config.centroid_options.top_k, Some(25));
        assert_eq!(config.centroid_options.uncertainty, 0.05);
        assert!(!config.argv.is_empty());
    }

    #[test]
    fn test_missing_config_file() {
        let mut a = args();
        a.config = Some(PathBuf::from("/nonexistent/pico.toml"));
        assert!(build_config(&a).is_err());
    }
}
