use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use pico::reader::WatersConverter;

use super::default_output;

/// Write the TIC, UV and detector traces of a Waters .raw directory
pub fn run(input: PathBuf, output: Option<PathBuf>) -> Result<()> {
    if !input.is_dir() {
        anyhow::bail!("Input is not a .raw directory: {}", input.display());
    }
    let output = output.unwrap_or_else(|| default_output(&input));

    info!("Input:  {}", input.display());
    info!("Output: {}", output.display());

    let stats = WatersConverter::new()
        .convert_chromatograms(&input, &output)
        .context("Chromatogram extraction failed")?;

    info!("Wrote {} chromatograms", stats.chromatograms);
    Ok(())
}
