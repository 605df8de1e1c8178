use anyhow::Result;
use log::info;
use std::path::PathBuf;

use pico::integrity::{check_integrity, IntegrityResult};

/// Check a Waters .raw directory before conversion
pub fn run(input: PathBuf) -> Result<()> {
    info!("Raw Integrity Check");
    info!("===================");
    info!("Directory: {}", input.display());

    let report = check_integrity(&input);

    #[cfg(feature = "colorized_output")]
    {
        println!("{}", report.format_colored());
    }

    #[cfg(not(feature = "colorized_output"))]
    {
        println!("{}", report);
    }

    // Exit with error code if a conversion would refuse this directory
    if report.result() == IntegrityResult::Error {
        std::process::exit(1);
    }

    Ok(())
}
